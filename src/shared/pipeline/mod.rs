pub mod decoder;
pub mod normalizer;
pub mod validator;

use crate::shared::{
    errors::{PipelineError, ValidationError},
    schema::{RangeTable, Record},
    storage::SensorStore,
};
use log::{error, info, warn};
use validator::Validator;

/// decode -> normalize -> validate -> persist, for one message at a time.
pub struct IngestPipeline {
    validator: Validator,
    store: SensorStore,
}

impl IngestPipeline {
    pub fn new(ranges: RangeTable, store: SensorStore) -> Self {
        IngestPipeline {
            validator: Validator::new(ranges),
            store,
        }
    }

    pub fn store(&self) -> &SensorStore {
        &self.store
    }

    /// Runs every stage and returns the persisted record.
    pub fn process(&self, payload: &[u8]) -> Result<Record, PipelineError> {
        let decoded = decoder::decode(payload)?;
        let normalized = normalizer::normalize(decoded);

        let outcome = self.validator.validate(&normalized);
        let validated = match outcome.record {
            Some(record) if outcome.accepted => record,
            _ => {
                return Err(ValidationError {
                    reasons: outcome.reasons,
                }
                .into())
            }
        };

        Ok(self.store.append(&validated)?)
    }

    /// Processes a message and logs the outcome. Never fails.
    pub fn handle(&self, payload: &[u8]) {
        info!("Received message: {}", String::from_utf8_lossy(payload).trim());

        match self.process(payload) {
            Ok(record) => info!("Data saved to CSV and JSON: {:?}", record),
            Err(PipelineError::Decode(e)) => {
                error!("{}", e);
                error!("Raw payload bytes: b\"{}\"", e.raw.escape_ascii());
            }
            Err(PipelineError::Validation(e)) => {
                for reason in &e.reasons {
                    warn!("Validation failed: {}", reason);
                }
                warn!("Reading discarded ({} problem(s))", e.reasons.len());
            }
            Err(PipelineError::Persistence(e)) => error!("Error saving reading: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::schema::FIELDS;
    use serde_json::{json, Value};
    use std::fs;

    fn pipeline(dir: &tempfile::TempDir) -> IngestPipeline {
        let store = SensorStore::new(
            dir.path().join("sensor_data.csv"),
            dir.path().join("sensor_data.json"),
        );
        store.init().unwrap();
        IngestPipeline::new(RangeTable::default(), store)
    }

    fn payload(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn accepted_reading_reaches_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);

        let record = pipeline
            .process(&payload(json!({
                "MAC_Address": "aa:bb:cc:dd:ee:01",
                "Crop_Number": "10.0",
                "Soil_PH": 6.8
            })))
            .unwrap();

        assert_eq!(record["mac_address"], json!("AA:BB:CC:DD:EE:01"));
        assert_eq!(record["crop_number"], json!(10));
        assert!(record["timestamp"].is_number());

        let entries = pipeline.store().snapshot().load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["soil_ph"], json!(6.8));

        let csv = fs::read_to_string(dir.path().join("sensor_data.csv")).unwrap();
        assert_eq!(csv.lines().count(), 2);
    }

    #[test]
    fn rejected_reading_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);

        let err = pipeline
            .process(&payload(json!({ "soil_ph": 11.0, "air_humidity": 150 })))
            .unwrap_err();
        match err {
            PipelineError::Validation(e) => assert_eq!(e.reasons.len(), 2),
            other => panic!("unexpected error: {other}"),
        }

        assert!(pipeline.store().snapshot().load().is_empty());
        let csv = fs::read_to_string(dir.path().join("sensor_data.csv")).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn undecodable_payload_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);

        let err = pipeline.process(b"<xml/>").unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[test]
    fn double_encoded_payload_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);

        let inner = serde_json::to_string(&json!({ "crop_number": 5 })).unwrap();
        let outer = serde_json::to_vec(&inner).unwrap();
        pipeline.process(&outer).unwrap();

        assert_eq!(pipeline.store().snapshot().load()[0]["crop_number"], json!(5));
    }

    #[test]
    fn n_accepted_readings_give_n_complete_objects() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);

        for crop in 0..7 {
            pipeline
                .process(&payload(json!({ "crop_number": crop, "soil_moisture": 30 + crop })))
                .unwrap();
        }
        pipeline.handle(b"garbage");
        pipeline.handle(&payload(json!({ "mac_address": "nope" })));

        let entries = pipeline.store().snapshot().load();
        assert_eq!(entries.len(), 7);
        for entry in entries {
            let object = entry.as_object().unwrap();
            assert_eq!(object.len(), FIELDS.len());
            assert!(FIELDS.iter().all(|field| object.contains_key(*field)));
        }
    }

    #[test]
    fn corrupt_snapshot_is_recovered_on_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir);
        fs::write(dir.path().join("sensor_data.json"), "{{{ not json").unwrap();

        pipeline.process(&payload(json!({ "crop_number": 9 }))).unwrap();

        let entries = pipeline.store().snapshot().load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["crop_number"], json!(9));
    }
}
