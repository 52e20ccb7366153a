use crate::shared::{
    errors::{Artifact, PersistenceError},
    schema::Record,
};
use log::warn;
use serde_json::Value;
use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// JSON array holding every accepted reading, rewritten on each append.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Snapshot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored entries. Absent, empty, corrupt or unreadable files read as no data.
    pub fn load(&self) -> Vec<Value> {
        self.read_entries().unwrap_or_else(|e| {
            warn!("Could not read snapshot '{}': {}", self.path.display(), e);
            Vec::new()
        })
    }

    /// Only a missing file or undecodable content count as empty.
    /// Any other read failure is returned so the file is not overwritten.
    fn read_entries(&self) -> io::Result<Vec<Value>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        if content.trim_ascii().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_slice::<Value>(&content) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(object @ Value::Object(_)) => Ok(vec![object]),
            Ok(_) | Err(_) => {
                warn!(
                    "Could not decode existing snapshot '{}'. Starting a new one.",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// Whole document as served to readers, `[]` if it is missing or not JSON.
    pub fn read_value(&self) -> Value {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_else(|| Value::Array(Vec::new()))
    }

    pub fn append(&self, record: &Record) -> Result<(), PersistenceError> {
        self.read_entries()
            .and_then(|mut entries| {
                entries.push(Value::Object(record.clone()));
                self.replace(&Value::Array(entries))
            })
            .map_err(|e| PersistenceError::new(Artifact::JsonSnapshot, &self.path, e))
    }

    /// Writes a sibling temp file, syncs it, then renames it over the target.
    fn replace(&self, document: &Value) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "snapshot path has no file name")
            })?;
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = parent.join(tmp_name);

        let body = serde_json::to_vec_pretty(document)?;
        let mut file = File::create(&tmp_path)?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }
}
