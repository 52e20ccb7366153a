use std::{fmt, io, path::PathBuf};
use thiserror::Error;

/// Payload that none of the decode strategies could turn into a JSON object.
#[derive(Debug, Error)]
#[error("payload could not be decoded as a JSON object ({} bytes)", .raw.len())]
pub struct DecodeError {
    pub raw: Vec<u8>,
}

/// Reading that is shaped like a record but failed one or more field checks.
#[derive(Debug, Error)]
#[error("reading rejected: {}", .reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    CsvLog,
    JsonSnapshot,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::CsvLog => write!(f, "csv_log"),
            Artifact::JsonSnapshot => write!(f, "json_snapshot"),
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to write {artifact} '{}': {source}", .path.display())]
pub struct PersistenceError {
    pub artifact: Artifact,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl PersistenceError {
    pub fn new(artifact: Artifact, path: impl Into<PathBuf>, source: io::Error) -> Self {
        PersistenceError {
            artifact,
            path: path.into(),
            source,
        }
    }
}

/// Everything that can go wrong while ingesting a single message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
