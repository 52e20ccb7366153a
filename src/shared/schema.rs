use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A reading as it flows through the pipeline: field name -> JSON value.
pub type Record = Map<String, Value>;

pub const TIMESTAMP: &str = "timestamp";
pub const MAC_ADDRESS: &str = "mac_address";

/// Schema fields that never take a range: copied as-is or checked by grammar.
pub const UNRANGED_FIELDS: [&str; 4] = ["timestamp", "mac_address", "date", "time"];

/// Fixed field order of every persisted reading.
pub const FIELDS: [&str; 14] = [
    "timestamp",
    "mac_address",
    "crop_number",
    "date",
    "time",
    "soil_moisture",
    "soil_nitrogen",
    "soil_phosphorus",
    "soil_potassium",
    "soil_temperature",
    "soil_conductivity",
    "soil_ph",
    "air_temperature",
    "air_humidity",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
        }
    }
}

/// Inclusive physical bounds of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldRange {
    pub kind: FieldKind,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub const fn integer(min: f64, max: f64) -> Self {
        FieldRange {
            kind: FieldKind::Integer,
            min,
            max,
        }
    }

    pub const fn float(min: f64, max: f64) -> Self {
        FieldRange {
            kind: FieldKind::Float,
            min,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Ordered table of validated fields. Order decides the order of rejection reasons.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTable {
    entries: Vec<(String, FieldRange)>,
}

impl Default for RangeTable {
    fn default() -> Self {
        let entries = [
            ("crop_number", FieldRange::integer(0.0, 100.0)),
            ("soil_moisture", FieldRange::float(0.0, 100.0)),
            ("soil_nitrogen", FieldRange::float(0.0, 200.0)),
            ("soil_phosphorus", FieldRange::float(0.0, 150.0)),
            ("soil_potassium", FieldRange::float(0.0, 500.0)),
            ("soil_temperature", FieldRange::float(-10.0, 60.0)),
            ("soil_conductivity", FieldRange::float(0.0, 200.0)),
            ("soil_ph", FieldRange::float(3.0, 10.0)),
            ("air_temperature", FieldRange::float(-40.0, 60.0)),
            ("air_humidity", FieldRange::float(0.0, 100.0)),
        ]
        .into_iter()
        .map(|(name, range)| (name.to_string(), range))
        .collect();

        RangeTable { entries }
    }
}

impl RangeTable {
    /// Replaces ranges of known fields in place and appends unknown ones.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, FieldRange>) -> Self {
        for (name, range) in overrides {
            let name = name.to_lowercase();
            match self.entries.iter_mut().find(|(field, _)| *field == name) {
                Some((_, existing)) => *existing = *range,
                None => self.entries.push((name, *range)),
            }
        }
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldRange> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, range)| range)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldRange)> {
        self.entries.iter().map(|(name, range)| (name.as_str(), range))
    }
}

/// Projects a record onto the fixed schema, in schema order. Missing keys become null.
pub fn project(record: &Record) -> Record {
    FIELDS
        .iter()
        .map(|field| {
            let value = record.get(*field).cloned().unwrap_or(Value::Null);
            (field.to_string(), value)
        })
        .collect()
}
