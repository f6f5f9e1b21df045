//! Core domain types for weightWatcher.
//!
//! - Measurements as stored in the data file
//! - Report values derived from them

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned measurement identifier
pub type MeasurementId = i64;

/// Date format accepted on input and written to the store
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Measurements
// ============================================================================

/// A single dated body-weight measurement
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Measurement {
    pub id: MeasurementId,
    pub date: NaiveDate,
    pub weight: f64,
}

// ============================================================================
// Reports
// ============================================================================

/// Current weight: the mean of the trailing summary window
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Summary {
    /// Arithmetic mean of every measurement in the window
    pub average: f64,
    /// Number of measurements that contributed
    pub count: usize,
    /// First calendar day of the window
    pub from: NaiveDate,
    /// Latest recorded date
    pub to: NaiveDate,
}

/// One row of the history report
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct HistoryPoint {
    pub id: MeasurementId,
    pub date: NaiveDate,
    pub weight: f64,
    /// Simple moving average ending at this measurement
    pub average: f64,
}
