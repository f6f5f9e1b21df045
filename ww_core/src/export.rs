//! Export measurements as CSV or JSON.

use crate::{Error, Measurement, Result, Store};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Output format for [`export`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: i64,
    date: String,
    weight: f64,
}

impl From<&Measurement> for CsvRow {
    fn from(measurement: &Measurement) -> Self {
        CsvRow {
            id: measurement.id,
            date: measurement.date.format(crate::DATE_FORMAT).to_string(),
            weight: measurement.weight,
        }
    }
}

/// Write measurements to `writer` and return how many were written
///
/// CSV output always starts with an `id,date,weight` header, JSON output is
/// a single array.
pub fn export<W, I>(writer: W, measurements: I, format: ExportFormat) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Measurement>,
{
    match format {
        ExportFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            csv_writer.write_record(["id", "date", "weight"])?;

            let mut count = 0;
            for measurement in measurements {
                csv_writer.serialize(CsvRow::from(&measurement))?;
                count += 1;
            }
            csv_writer.flush()?;
            Ok(count)
        }
        ExportFormat::Json => {
            let measurements: Vec<Measurement> = measurements.into_iter().collect();
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &measurements)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            Ok(measurements.len())
        }
    }
}

/// Export every measurement of `store` into the file at `path`
///
/// The output is written to a temp file next to `path` and renamed over it
/// once complete, so a failed export leaves any previous file intact. The
/// data file itself is never a valid target.
pub fn export_to_path(store: &Store, path: &Path, format: ExportFormat) -> Result<usize> {
    if is_same_file(store.path(), path) {
        return Err(Error::ExportOverDataFile(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp = NamedTempFile::new_in(dir)?;

    let count = store.with_measurements(|measurements| {
        export(BufWriter::new(temp.as_file()), measurements, format)
    })??;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} measurements to {:?}", count, path);
    Ok(count)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
