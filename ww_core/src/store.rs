//! SQLite data file holding measurements and the store metadata.
//!
//! A data file is only usable once its `properties` table carries every
//! entry of [`PROPERTIES`]. All statements are parameterized.

use crate::{Error, Measurement, MeasurementId, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Metadata identifying a weightWatcher data file, written once at creation
pub const PROPERTIES: [(&str, &str); 2] = [
    ("applicationName", "weightWatcher"),
    ("databaseVersion", "1.0"),
];

const SCHEMA: &str = r#"
CREATE TABLE measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date DATE NOT NULL,
    weight REAL NOT NULL
);
CREATE TABLE properties (
    key TEXT NOT NULL,
    value TEXT NOT NULL
);
"#;

const SELECT_MEASUREMENT: &str = "SELECT id, date, weight FROM measurements WHERE id = ?1";

/// Handle on an open data file. Dropping it closes the connection.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Create a new data file at `path` and open it
    ///
    /// The database is built in a temp file in the same directory and moved
    /// into place without clobbering, so `path` either ends up as a complete
    /// store or is left untouched.
    pub fn initialize(path: &Path) -> Result<Self> {
        if path.exists() {
            return Err(Error::AlreadyExists(path.to_path_buf()));
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;

        {
            let mut conn = Connection::open(temp.path())?;
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA)?;
            {
                let mut stmt = tx.prepare("INSERT INTO properties (key, value) VALUES (?1, ?2)")?;
                for (key, value) in PROPERTIES {
                    stmt.execute(params![key, value])?;
                }
            }
            tx.commit()?;
            conn.close().map_err(|(_, e)| Error::Database(e))?;
        }

        temp.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                Error::AlreadyExists(path.to_path_buf())
            } else {
                Error::Io(e.error)
            }
        })?;

        tracing::info!("Created data file {:?}", path);
        Self::open(path)
    }

    /// Open an existing data file, checking its metadata
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            tracing::debug!("Unable to open {:?} as a database: {}", path, e);
            Error::InvalidStore(path.to_path_buf())
        })?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };

        let properties = match store.read_properties() {
            Ok(properties) => properties,
            Err(e) => {
                tracing::debug!("Unable to read properties of {:?}: {}", path, e);
                return Err(Error::InvalidStore(path.to_path_buf()));
            }
        };

        // Extra keys are fine, missing or different ones are not
        for (key, expected) in PROPERTIES {
            if properties.get(key).map(String::as_str) != Some(expected) {
                tracing::debug!(
                    "Property {} of {:?} is {:?}, expected {:?}",
                    key,
                    path,
                    properties.get(key),
                    expected
                );
                return Err(Error::InvalidStore(path.to_path_buf()));
            }
        }

        tracing::debug!("Opened data file {:?}", path);
        Ok(store)
    }

    /// Path this store was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_properties(&self) -> rusqlite::Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM properties")?;
        let properties = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>();
        properties
    }

    // === Measurement operations ===

    /// Append a measurement and return its new id
    pub fn insert(&self, date: NaiveDate, weight: f64) -> Result<MeasurementId> {
        check_weight(weight)?;
        self.conn.execute(
            "INSERT INTO measurements (date, weight) VALUES (?1, ?2)",
            params![date, weight],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!("Inserted measurement {} ({}, {})", id, date, weight);
        Ok(id)
    }

    /// Get a measurement by id
    pub fn get(&self, id: MeasurementId) -> Result<Option<Measurement>> {
        let measurement = self
            .conn
            .query_row(SELECT_MEASUREMENT, [id], measurement_from_row)
            .optional()?;
        Ok(measurement)
    }

    pub fn exists(&self, id: MeasurementId) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM measurements WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Change the supplied fields of a measurement in one transaction
    pub fn update(
        &mut self,
        id: MeasurementId,
        date: Option<NaiveDate>,
        weight: Option<f64>,
    ) -> Result<Measurement> {
        if let Some(weight) = weight {
            check_weight(weight)?;
        }

        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE measurements
             SET date = COALESCE(?2, date),
                 weight = COALESCE(?3, weight)
             WHERE id = ?1",
            params![id, date, weight],
        )?;
        if changed == 0 {
            return Err(Error::RecordNotFound(id));
        }
        let updated = tx.query_row(SELECT_MEASUREMENT, [id], measurement_from_row)?;
        tx.commit()?;

        tracing::info!("Updated measurement {}", id);
        Ok(updated)
    }

    /// Remove a measurement, returning what was removed
    pub fn delete(&mut self, id: MeasurementId) -> Result<Measurement> {
        let tx = self.conn.transaction()?;
        let removed = tx
            .query_row(SELECT_MEASUREMENT, [id], measurement_from_row)
            .optional()?
            .ok_or(Error::RecordNotFound(id))?;
        tx.execute("DELETE FROM measurements WHERE id = ?1", [id])?;
        tx.commit()?;

        tracing::info!("Deleted measurement {}", id);
        Ok(removed)
    }

    /// Number of stored measurements
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Stream every measurement, ordered by date then id, through `f`
    ///
    /// Rows are read lazily while `f` pulls from the iterator. Each call runs
    /// the query again. A row that fails to load ends the iteration and is
    /// reported as the error of the whole call.
    pub fn with_measurements<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Measurement>) -> T,
    {
        let mut stmt = self
            .conn
            .prepare("SELECT id, date, weight FROM measurements ORDER BY date ASC, id ASC")?;
        let mut rows = stmt.query_map([], measurement_from_row)?;

        let mut failure: Option<rusqlite::Error> = None;
        let mut measurements = std::iter::from_fn(|| {
            if failure.is_some() {
                return None;
            }
            match rows.next()? {
                Ok(measurement) => Some(measurement),
                Err(e) => {
                    failure = Some(e);
                    None
                }
            }
        });

        let output = f(&mut measurements);
        drop(measurements);

        match failure {
            Some(e) => Err(Error::Database(e)),
            None => Ok(output),
        }
    }

    /// All measurements ordered by date then id
    pub fn list_all(&self) -> Result<Vec<Measurement>> {
        self.with_measurements(|measurements| measurements.collect())
    }
}

fn measurement_from_row(row: &Row) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        date: row.get(1)?,
        weight: row.get(2)?,
    })
}

/// Weights must be finite and non-negative
pub fn check_weight(weight: f64) -> Result<()> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidWeight(weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, crate::DATE_FORMAT).unwrap()
    }

    fn new_store() -> (TempDir, Store) {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Store::initialize(&temp_dir.path().join("ww.db")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_insert_then_get() {
        let (_dir, store) = new_store();

        let id = store.insert(day("2020-01-01"), 80.0).unwrap();
        let measurement = store.get(id).unwrap().unwrap();

        assert_eq!(measurement.id, id);
        assert_eq!(measurement.date, day("2020-01-01"));
        assert_eq!(measurement.weight, 80.0);
    }

    #[test]
    fn test_ids_are_unique_and_same_day_allowed() {
        let (_dir, store) = new_store();

        let a = store.insert(day("2020-01-01"), 80.0).unwrap();
        let b = store.insert(day("2020-01-01"), 80.4).unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_update_date_keeps_weight() {
        let (_dir, mut store) = new_store();
        let id = store.insert(day("2020-01-01"), 80.0).unwrap();

        let updated = store.update(id, Some(day("2020-01-02")), None).unwrap();

        assert_eq!(updated.date, day("2020-01-02"));
        assert_eq!(updated.weight, 80.0);
        assert_eq!(store.get(id).unwrap().unwrap(), updated);
    }

    #[test]
    fn test_update_weight_keeps_date() {
        let (_dir, mut store) = new_store();
        let id = store.insert(day("2020-01-01"), 80.0).unwrap();

        let updated = store.update(id, None, Some(79.5)).unwrap();

        assert_eq!(updated.date, day("2020-01-01"));
        assert_eq!(updated.weight, 79.5);
    }

    #[test]
    fn test_update_missing_record() {
        let (_dir, mut store) = new_store();

        let err = store.update(42, None, Some(70.0)).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(42)));
    }

    #[test]
    fn test_update_rejects_negative_weight_without_change() {
        let (_dir, mut store) = new_store();
        let id = store.insert(day("2020-01-01"), 80.0).unwrap();

        let err = store
            .update(id, Some(day("2021-01-01")), Some(-1.0))
            .unwrap_err();

        assert!(matches!(err, Error::InvalidWeight(_)));
        let unchanged = store.get(id).unwrap().unwrap();
        assert_eq!(unchanged.date, day("2020-01-01"));
        assert_eq!(unchanged.weight, 80.0);
    }

    #[test]
    fn test_delete_then_exists() {
        let (_dir, mut store) = new_store();
        let id = store.insert(day("2020-01-01"), 80.0).unwrap();
        assert!(store.exists(id).unwrap());

        let removed = store.delete(id).unwrap();
        assert_eq!(removed.weight, 80.0);
        assert!(!store.exists(id).unwrap());

        let err = store.delete(id).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }

    #[test]
    fn test_deleted_ids_not_reused() {
        let (_dir, mut store) = new_store();
        let first = store.insert(day("2020-01-01"), 80.0).unwrap();
        store.delete(first).unwrap();

        let second = store.insert(day("2020-01-02"), 81.0).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_list_ordered_by_date_then_id() {
        let (_dir, store) = new_store();
        let late = store.insert(day("2020-01-03"), 70.0).unwrap();
        let early_a = store.insert(day("2020-01-01"), 71.0).unwrap();
        let early_b = store.insert(day("2020-01-01"), 72.0).unwrap();
        let middle = store.insert(day("2020-01-02"), 73.0).unwrap();

        let ids: Vec<_> = store.list_all().unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![early_a, early_b, middle, late]);
    }

    #[test]
    fn test_listing_is_restartable() {
        let (_dir, store) = new_store();
        store.insert(day("2020-01-01"), 70.0).unwrap();
        store.insert(day("2020-01-02"), 71.0).unwrap();

        let first = store.with_measurements(|ms| ms.take(1).count()).unwrap();
        let second = store.list_all().unwrap();

        assert_eq!(first, 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn test_empty_store() {
        let (_dir, store) = new_store();
        assert!(store.is_empty().unwrap());
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_initialize_existing_file_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ww.db");
        std::fs::write(&path, "precious").unwrap();

        let err = Store::initialize(&path).err().unwrap();

        assert!(matches!(err, Error::AlreadyExists(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "precious");
    }

    #[test]
    fn test_initialize_twice() {
        let (dir, store) = new_store();
        drop(store);

        let err = Store::initialize(&dir.path().join("ww.db")).err().unwrap();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_initialize_leaves_no_temp_files() {
        let (dir, store) = new_store();
        drop(store);

        let extras: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "ww.db")
            .collect();
        assert!(extras.is_empty(), "Expected only ww.db, found extras: {:?}", extras);
    }

    #[test]
    fn test_initialize_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("no/such/dir/ww.db");

        let err = Store::initialize(&path).err().unwrap();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_initialize_writes_properties() {
        let (dir, store) = new_store();
        drop(store);

        let conn = Connection::open(dir.path().join("ww.db")).unwrap();
        let mut stmt = conn
            .prepare("SELECT key, value FROM properties ORDER BY key")
            .unwrap();
        let rows: Vec<(String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        assert_eq!(
            rows,
            vec![
                ("applicationName".to_string(), "weightWatcher".to_string()),
                ("databaseVersion".to_string(), "1.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_open_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Store::open(&temp_dir.path().join("ww.db")).err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_open_without_properties() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("other.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE measurements (id INTEGER PRIMARY KEY, date DATE, weight REAL);")
            .unwrap();
        drop(conn);

        let err = Store::open(&path).err().unwrap();
        assert!(matches!(err, Error::InvalidStore(_)));
    }

    #[test]
    fn test_open_wrong_property_value() {
        let (dir, store) = new_store();
        drop(store);
        let path = dir.path().join("ww.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "UPDATE properties SET value = '2.0' WHERE key = 'databaseVersion'",
            [],
        )
        .unwrap();
        drop(conn);

        let err = Store::open(&path).err().unwrap();
        assert!(matches!(err, Error::InvalidStore(_)));
    }

    #[test]
    fn test_open_tolerates_extra_properties() {
        let (dir, store) = new_store();
        drop(store);
        let path = dir.path().join("ww.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO properties (key, value) VALUES ('owner', 'me')",
            [],
        )
        .unwrap();
        drop(conn);

        assert!(Store::open(&path).is_ok());
    }

    #[test]
    fn test_open_directory() {
        let temp_dir = tempfile::tempdir().unwrap();

        let err = Store::open(temp_dir.path()).err().unwrap();
        assert!(matches!(err, Error::InvalidStore(_)));
    }

    #[test]
    fn test_open_not_a_database() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, "this is definitely not a sqlite database file").unwrap();

        let err = Store::open(&path).err().unwrap();
        assert!(matches!(err, Error::InvalidStore(_)));
    }
}
