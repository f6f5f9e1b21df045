#![forbid(unsafe_code)]

//! Core domain model and business logic for weightWatcher.
//!
//! This crate provides:
//! - Domain types (measurements, report values)
//! - The SQLite data file store
//! - Measurement commands with input validation
//! - Summary and moving-average history reports
//! - Configuration, logging and export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod service;
pub mod report;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::Store;
pub use service::{AddRequest, EditRequest, RemoveRequest};
pub use report::{history, summary, MovingAverage};
pub use export::{export, export_to_path, ExportFormat};
