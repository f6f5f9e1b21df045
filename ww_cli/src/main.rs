use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use ww_core::service::{self, AddRequest, EditRequest, RemoveRequest};
use ww_core::*;

#[derive(Parser)]
#[command(name = "ww", version)]
#[command(about = "Keeps track of your weight", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data file (overrides data.file from the config)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Show more output
    #[arg(short = 'b', long, global = true)]
    verbose: bool,

    /// Read settings from this file instead of the default config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Init a new data file specified by the user
    #[command(alias = "I")]
    Init,

    /// Add a new measurement
    #[command(alias = "A")]
    Add {
        /// Date of measurement (format: YYYY-MM-DD) [default: today]
        #[arg(short, long)]
        date: Option<String>,

        /// Measured weight
        #[arg(short, long)]
        weight: Option<f64>,
    },

    /// Edit a measurement
    #[command(alias = "E")]
    Edit {
        /// Id of the edited measurement
        #[arg(short, long)]
        id: Option<i64>,

        /// New date (format: YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// New weight
        #[arg(short, long)]
        weight: Option<f64>,
    },

    /// Remove a measurement
    #[command(alias = "R")]
    Remove {
        /// Id of the removed measurement
        #[arg(short, long)]
        id: Option<i64>,
    },

    /// Show report
    #[command(alias = "S")]
    Show {
        #[command(subcommand)]
        report: Report,
    },

    /// Export all measurements
    #[command(alias = "X")]
    Export {
        /// Output format (csv, json)
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum Report {
    /// Current weight (average of last few days)
    Summary {
        /// Number of calendar days to average [default: report.summary_days]
        #[arg(long)]
        days: Option<u32>,
    },

    /// Historical data with moving average (<x> periods)
    History {
        /// Moving average window [default: report.history_periods]
        #[arg(short, long)]
        periods: Option<usize>,
    },

    /// All measurements in date order
    List,
}

fn main() -> ExitCode {
    // Initialize logging
    ww_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ww: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Flags win over the config file
    let file = cli.file.or_else(|| config.data.file.clone());
    let verbose = cli.verbose || config.output.verbose;

    match cli.command {
        Commands::Init => cmd_init(file, verbose),
        Commands::Add { date, weight } => cmd_add(
            AddRequest {
                file,
                date: Some(date.unwrap_or_else(today)),
                weight,
            },
            verbose,
        ),
        Commands::Edit { id, date, weight } => cmd_edit(
            EditRequest {
                file,
                id,
                date,
                weight,
            },
            verbose,
        ),
        Commands::Remove { id } => cmd_remove(RemoveRequest { file, id }, verbose),
        Commands::Show { report } => match report {
            Report::Summary { days } => {
                cmd_summary(file, days.unwrap_or(config.report.summary_days))
            }
            Report::History { periods } => {
                cmd_history(file, periods.unwrap_or(config.report.history_periods))
            }
            Report::List => cmd_list(file),
        },
        Commands::Export { format, output } => cmd_export(file, format, output, verbose),
    }
}

fn today() -> String {
    chrono::Local::now()
        .date_naive()
        .format(DATE_FORMAT)
        .to_string()
}

fn cmd_init(file: Option<PathBuf>, verbose: bool) -> Result<()> {
    let path = service::init(file.as_deref())?;

    if verbose {
        println!("ww: created file {}.", path.display());
    }
    Ok(())
}

fn cmd_add(request: AddRequest, verbose: bool) -> Result<()> {
    let measurement = service::add(&request)?;

    if verbose {
        println!(
            "ww: added measurement {:.2} with date {} (id {}).",
            measurement.weight, measurement.date, measurement.id
        );
    }
    Ok(())
}

fn cmd_edit(request: EditRequest, verbose: bool) -> Result<()> {
    let measurement = service::edit(&request)?;

    if verbose {
        println!(
            "ww: measurement {} is now {:.2} with date {}.",
            measurement.id, measurement.weight, measurement.date
        );
    }
    Ok(())
}

fn cmd_remove(request: RemoveRequest, verbose: bool) -> Result<()> {
    let measurement = service::remove(&request)?;

    if verbose {
        println!(
            "ww: removed measurement {} ({:.2} with date {}).",
            measurement.id, measurement.weight, measurement.date
        );
    }
    Ok(())
}

fn cmd_summary(file: Option<PathBuf>, days: u32) -> Result<()> {
    let store = service::open_store(file.as_deref())?;
    let current = store.with_measurements(|measurements| summary(measurements, days))??;

    match current {
        Some(current) => println!(
            "Current weight: {:.2} (average of {} measurements from {} to {})",
            current.average, current.count, current.from, current.to
        ),
        None => println!("No data."),
    }
    Ok(())
}

fn cmd_history(file: Option<PathBuf>, periods: usize) -> Result<()> {
    let store = service::open_store(file.as_deref())?;

    store.with_measurements(|measurements| -> Result<()> {
        let mut out = io::stdout().lock();
        for point in history(measurements, periods)? {
            writeln!(
                out,
                "{}  {:>8.2}  {:>8.2}",
                point.date, point.weight, point.average
            )?;
        }
        Ok(())
    })?
}

fn cmd_list(file: Option<PathBuf>) -> Result<()> {
    let store = service::open_store(file.as_deref())?;

    store.with_measurements(|measurements| -> Result<()> {
        let mut out = io::stdout().lock();
        for measurement in measurements {
            writeln!(
                out,
                "{:>6}  {}  {:>8.2}",
                measurement.id, measurement.date, measurement.weight
            )?;
        }
        Ok(())
    })?
}

fn cmd_export(
    file: Option<PathBuf>,
    format: ExportFormat,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let store = service::open_store(file.as_deref())?;

    let count = match &output {
        Some(path) => export_to_path(&store, path, format)?,
        None => store.with_measurements(|measurements| {
            export(io::stdout().lock(), measurements, format)
        })??,
    };

    if verbose {
        // stdout may be carrying the export itself
        match &output {
            Some(path) => println!("ww: exported {} measurements to {}.", count, path.display()),
            None => eprintln!("ww: exported {} measurements.", count),
        }
    }
    Ok(())
}
