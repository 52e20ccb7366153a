use crate::shared::schema::{FieldKind, FieldRange, RangeTable, Record, MAC_ADDRESS};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{2}(:[0-9A-Fa-f]{2}){5}$").expect("MAC address pattern is valid")
});

/// Result of checking one normalized reading.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub record: Option<Record>,
    pub reasons: Vec<String>,
}

impl ValidationOutcome {
    fn rejected(reasons: Vec<String>) -> Self {
        ValidationOutcome {
            accepted: false,
            record: None,
            reasons,
        }
    }
}

pub struct Validator {
    ranges: RangeTable,
}

impl Validator {
    pub fn new(ranges: RangeTable) -> Self {
        Validator { ranges }
    }

    /// All-or-nothing check of a normalized reading.
    ///
    /// A malformed MAC address rejects immediately. Every ranged field is
    /// checked after that so all violations are reported together.
    pub fn validate(&self, normalized: &Record) -> ValidationOutcome {
        let mut record = normalized.clone();

        match check_mac(normalized.get(MAC_ADDRESS)) {
            Ok(Some(mac)) => {
                record.insert(MAC_ADDRESS.to_string(), Value::String(mac));
            }
            Ok(None) => {}
            Err(reason) => return ValidationOutcome::rejected(vec![reason]),
        }

        let mut reasons = Vec::new();
        for (field, range) in self.ranges.iter() {
            let Some(value) = normalized.get(field) else {
                continue;
            };
            match check_field(field, value, range) {
                Ok(Some(coerced)) => {
                    record.insert(field.to_string(), coerced);
                }
                Ok(None) => {}
                Err(reason) => reasons.push(reason),
            }
        }

        if reasons.is_empty() {
            ValidationOutcome {
                accepted: true,
                record: Some(record),
                reasons,
            }
        } else {
            ValidationOutcome::rejected(reasons)
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Returns the upper-cased address, `None` when absent.
fn check_mac(value: Option<&Value>) -> Result<Option<String>, String> {
    match value {
        None => Ok(None),
        Some(value) if is_blank(value) => Ok(None),
        Some(Value::String(mac)) if MAC_PATTERN.is_match(mac.trim()) => {
            Ok(Some(mac.trim().to_uppercase()))
        }
        Some(other) => Err(format!(
            "{}: invalid format {} (expected XX:XX:XX:XX:XX:XX)",
            MAC_ADDRESS, other
        )),
    }
}

/// Coerces a field to its declared kind and checks it against its range.
/// Blank values are valid and left untouched.
fn check_field(field: &str, value: &Value, range: &FieldRange) -> Result<Option<Value>, String> {
    if is_blank(value) {
        return Ok(None);
    }

    let number = as_number(value).ok_or_else(|| {
        format!(
            "{}: invalid type {} (expected {})",
            field,
            value,
            range.kind.as_str()
        )
    })?;

    let (checked, coerced) = match range.kind {
        FieldKind::Integer => {
            let truncated = number.trunc();
            (truncated, Value::from(truncated as i64))
        }
        FieldKind::Float => (number, Value::from(number)),
    };

    if !range.contains(checked) {
        return Err(format!(
            "{}: value {} out of range [{}, {}]",
            field, checked, range.min, range.max
        ));
    }

    Ok(Some(coerced))
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
