//! Error types for the ww_core library.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ww_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No data file given on the command line or in the config
    #[error("missing information about data file. Specify it with --file or -f flag, or set data.file in the config")]
    MissingFile,

    #[error("missing date parameter. Specify it with --date or -d flag")]
    MissingDate,

    #[error("missing weight parameter. Specify it with --weight or -w flag")]
    MissingWeight,

    #[error("missing ID parameter. Specify it with --id or -i flag")]
    MissingId,

    /// Refusing to initialize over an existing file
    #[error("file {} already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Data file does not exist
    #[error("file {} does not exist", .0.display())]
    NotFound(PathBuf),

    /// File exists but is not a weightWatcher data file
    #[error("file {} is not a correct weightWatcher data file", .0.display())]
    InvalidStore(PathBuf),

    /// No measurement with the given id
    #[error("measurement with id={0} does not exist")]
    RecordNotFound(i64),

    #[error("invalid date {0:?}, expected format YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid weight {0}, expected a non-negative number")]
    InvalidWeight(f64),

    /// Moving average window must cover at least one measurement
    #[error("invalid moving average window {0}, expected at least 1 period")]
    InvalidWindow(usize),

    #[error("unknown export format {0:?}, expected csv or json")]
    InvalidFormat(String),

    /// Export target is the data file being exported
    #[error("refusing to export over the data file {}", .0.display())]
    ExportOverDataFile(PathBuf),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Config file exists but is not valid TOML
    #[error("syntax error in {}: {source}", path.display())]
    ConfigSyntax {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
