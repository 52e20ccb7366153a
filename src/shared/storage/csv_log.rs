use crate::shared::{
    errors::{Artifact, PersistenceError},
    schema::{Record, FIELDS},
};
use serde_json::Value;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Append-only comma-separated log, one row per accepted reading.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with its header row unless it already exists.
    pub fn ensure_header(&self) -> Result<(), PersistenceError> {
        self.create_with_header()
            .map_err(|e| PersistenceError::new(Artifact::CsvLog, &self.path, e))
    }

    pub fn append(&self, record: &Record) -> Result<(), PersistenceError> {
        self.create_with_header()
            .and_then(|_| {
                let mut file = OpenOptions::new().append(true).open(&self.path)?;
                file.write_all(format_row(record).as_bytes())?;
                file.flush()
            })
            .map_err(|e| PersistenceError::new(Artifact::CsvLog, &self.path, e))
    }

    fn create_with_header(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => write_header(&mut file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn write_header(file: &mut File) -> io::Result<()> {
    let mut header = FIELDS.join(",");
    header.push('\n');
    file.write_all(header.as_bytes())?;
    file.flush()
}

fn format_row(record: &Record) -> String {
    let mut row = FIELDS
        .iter()
        .map(|field| format_cell(record.get(*field).unwrap_or(&Value::Null)))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

fn format_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}
