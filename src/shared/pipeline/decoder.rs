use crate::shared::{errors::DecodeError, schema::Record};
use log::{info, warn};
use serde_json::Value;

/// Ways a sensor payload is known to arrive, tried in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// `{"soil_ph": 6.5}`
    Direct,
    /// `"{\"soil_ph\": 6.5}"`: an object serialized to JSON twice.
    DoubleEncoded,
    /// `{\"soil_ph\": 6.5}` or `'{"soil_ph": 6.5}'`: an escaped string literal.
    EscapedLiteral,
}

impl DecodeStrategy {
    pub const ALL: [DecodeStrategy; 3] = [
        DecodeStrategy::Direct,
        DecodeStrategy::DoubleEncoded,
        DecodeStrategy::EscapedLiteral,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DecodeStrategy::Direct => "direct",
            DecodeStrategy::DoubleEncoded => "double-encoded",
            DecodeStrategy::EscapedLiteral => "escaped literal",
        }
    }

    pub fn attempt(&self, text: &str) -> Result<Record, String> {
        match self {
            DecodeStrategy::Direct => parse_object(text),
            DecodeStrategy::DoubleEncoded => {
                let inner: String = serde_json::from_str(text).map_err(|e| e.to_string())?;
                parse_object(inner.trim())
            }
            DecodeStrategy::EscapedLiteral => {
                let unescaped = unescape_literal(text)?;
                parse_object(unescaped.trim())
            }
        }
    }
}

/// Turns a raw payload into a JSON object, stopping at the first strategy that works.
pub fn decode(payload: &[u8]) -> Result<Record, DecodeError> {
    let text = match std::str::from_utf8(payload) {
        Ok(text) => text.trim(),
        Err(e) => {
            warn!("Payload is not valid UTF-8: {}", e);
            return Err(DecodeError {
                raw: payload.to_vec(),
            });
        }
    };

    for strategy in DecodeStrategy::ALL {
        match strategy.attempt(text) {
            Ok(record) => {
                info!("JSON parsed successfully ({} decode)", strategy.name());
                return Ok(record);
            }
            Err(e) => warn!("{} decode failed: {}", strategy.name(), e),
        }
    }

    Err(DecodeError {
        raw: payload.to_vec(),
    })
}

fn parse_object(text: &str) -> Result<Record, String> {
    match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected a JSON object, found {}", json_type(&other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strips one pair of surrounding quotes and resolves backslash escapes.
fn unescape_literal(text: &str) -> Result<String, String> {
    let inner = strip_quotes(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| "dangling backslash at end of payload".to_string())?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' | '/' => out.push(escaped),
            '\n' => {}
            'x' => out.push(hex_char(&mut chars, 2)?),
            'u' => out.push(hex_char(&mut chars, 4)?),
            'U' => out.push(hex_char(&mut chars, 8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Ok(out)
}

fn strip_quotes(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err(format!("truncated \\x/\\u escape '{}'", hex));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape sequence '{}'", hex))
}
