use crate::shared::schema::{Record, FIELDS, TIMESTAMP};
use chrono::Utc;
use serde_json::Value;

/// Lower-cases keys, stamps the receipt time if the sender sent none and
/// fills every missing schema field with null.
///
/// Keys that only differ in case collapse onto one entry; the last one wins.
pub fn normalize(decoded: Record) -> Record {
    let mut normalized = Record::new();
    for (key, value) in decoded {
        normalized.insert(key.to_lowercase(), value);
    }

    if !normalized.contains_key(TIMESTAMP) {
        normalized.insert(TIMESTAMP.to_string(), receipt_timestamp());
    }

    for field in FIELDS {
        if !normalized.contains_key(field) {
            normalized.insert(field.to_string(), Value::Null);
        }
    }

    normalized
}

/// Current UTC wall-clock time in fractional seconds since the epoch.
fn receipt_timestamp() -> Value {
    let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    Value::from(now)
}
