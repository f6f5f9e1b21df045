//! Measurement commands with uniform input validation.
//!
//! Every operation checks its inputs in a fixed order before touching the
//! data file: file, required fields, id, field formats, then the store
//! itself and finally record existence.

use crate::{Error, Measurement, MeasurementId, Result, Store, DATE_FORMAT};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Add a new measurement
#[derive(Clone, Debug, Default)]
pub struct AddRequest {
    pub file: Option<PathBuf>,
    pub date: Option<String>,
    pub weight: Option<f64>,
}

/// Change the date and/or weight of an existing measurement
#[derive(Clone, Debug, Default)]
pub struct EditRequest {
    pub file: Option<PathBuf>,
    pub id: Option<MeasurementId>,
    pub date: Option<String>,
    pub weight: Option<f64>,
}

/// Remove an existing measurement
#[derive(Clone, Debug, Default)]
pub struct RemoveRequest {
    pub file: Option<PathBuf>,
    pub id: Option<MeasurementId>,
}

/// Create a new, empty data file
pub fn init(file: Option<&Path>) -> Result<PathBuf> {
    let path = require_file(file)?;
    Store::initialize(path)?;
    Ok(path.to_path_buf())
}

/// Open the data file for reading reports
pub fn open_store(file: Option<&Path>) -> Result<Store> {
    Store::open(require_file(file)?)
}

pub fn add(request: &AddRequest) -> Result<Measurement> {
    let path = require_file(request.file.as_deref())?;
    let date = non_empty(request.date.as_deref()).ok_or(Error::MissingDate)?;
    let weight = request.weight.ok_or(Error::MissingWeight)?;

    let date = parse_date(date)?;
    crate::store::check_weight(weight)?;

    let store = Store::open(path)?;
    let id = store.insert(date, weight)?;
    Ok(Measurement { id, date, weight })
}

pub fn edit(request: &EditRequest) -> Result<Measurement> {
    let path = require_file(request.file.as_deref())?;
    let id = require_id(request.id)?;
    // An empty date means the date is left as it is
    let date = non_empty(request.date.as_deref())
        .map(parse_date)
        .transpose()?;
    if let Some(weight) = request.weight {
        crate::store::check_weight(weight)?;
    }

    let mut store = Store::open(path)?;
    if !store.exists(id)? {
        return Err(Error::RecordNotFound(id));
    }

    if date.is_none() && request.weight.is_none() {
        tracing::debug!("Nothing to change for measurement {}", id);
        return store.get(id)?.ok_or(Error::RecordNotFound(id));
    }

    store.update(id, date, request.weight)
}

pub fn remove(request: &RemoveRequest) -> Result<Measurement> {
    let path = require_file(request.file.as_deref())?;
    let id = require_id(request.id)?;

    let mut store = Store::open(path)?;
    if !store.exists(id)? {
        return Err(Error::RecordNotFound(id));
    }

    store.delete(id)
}

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let date =
        NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))?;

    // chrono tolerates signs, padding spaces and unpadded fields
    if date.format(DATE_FORMAT).to_string() != s {
        return Err(Error::InvalidDate(s.to_string()));
    }
    Ok(date)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn require_file(file: Option<&Path>) -> Result<&Path> {
    match file {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => Err(Error::MissingFile),
    }
}

fn require_id(id: Option<MeasurementId>) -> Result<MeasurementId> {
    match id {
        Some(id) if id >= 0 => Ok(id),
        _ => Err(Error::MissingId),
    }
}
