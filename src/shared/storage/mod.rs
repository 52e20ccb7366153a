pub mod csv_log;
pub mod snapshot;

use crate::shared::{
    errors::PersistenceError,
    schema::{self, Record},
};
use csv_log::CsvLog;
use log::error;
use snapshot::Snapshot;
use std::{path::PathBuf, sync::Mutex};

/// Both output artifacts of the pipeline behind one lock.
pub struct SensorStore {
    csv_log: CsvLog,
    snapshot: Snapshot,
    write_lock: Mutex<()>,
}

impl SensorStore {
    pub fn new(csv_file: impl Into<PathBuf>, json_file: impl Into<PathBuf>) -> Self {
        SensorStore {
            csv_log: CsvLog::new(csv_file),
            snapshot: Snapshot::new(json_file),
            write_lock: Mutex::new(()),
        }
    }

    pub fn init(&self) -> Result<(), PersistenceError> {
        self.csv_log.ensure_header()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Appends an accepted reading to both artifacts and returns what was written.
    ///
    /// Each artifact is attempted even if the other fails. When both fail the
    /// tabular log error is logged here and the snapshot error returned.
    pub fn append(&self, record: &Record) -> Result<Record, PersistenceError> {
        let row = schema::project(record);
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let csv = self.csv_log.append(&row);
        let snapshot = self.snapshot.append(&row);

        match (csv, snapshot) {
            (Ok(()), Ok(())) => Ok(row),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(csv_err), Err(snapshot_err)) => {
                error!("{}", csv_err);
                Err(snapshot_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::Artifact;
    use crate::shared::schema::FIELDS;
    use serde_json::{json, Value};
    use std::fs;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn appended_records_carry_exactly_the_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = SensorStore::new(
            dir.path().join("sensor_data.csv"),
            dir.path().join("sensor_data.json"),
        );
        store.init().unwrap();

        for crop in 0..5 {
            store
                .append(&record(json!({ "crop_number": crop, "battery": "ok" })))
                .unwrap();
        }

        let entries = store.snapshot().load();
        assert_eq!(entries.len(), 5);
        for entry in &entries {
            let object = entry.as_object().unwrap();
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            assert_eq!(keys, FIELDS.to_vec());
        }

        let csv = fs::read_to_string(dir.path().join("sensor_data.csv")).unwrap();
        assert_eq!(csv.lines().count(), 6);
    }

    #[test]
    fn snapshot_failure_still_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        let json_path = blocked.join("sensor_data.json");
        // a directory where the snapshot file should be makes the rename fail
        fs::create_dir(&json_path).unwrap();

        let store = SensorStore::new(dir.path().join("sensor_data.csv"), &json_path);
        let err = store
            .append(&record(json!({ "crop_number": 1 })))
            .unwrap_err();
        assert_eq!(err.artifact, Artifact::JsonSnapshot);

        let csv = fs::read_to_string(dir.path().join("sensor_data.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}
