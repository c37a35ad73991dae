use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum RelevanceError {
    /// A document or container could not be read from the corpus.
    #[error("Read error for '{path}': {reason}")]
    Read { path: String, reason: String },
    /// Container content is not a valid node/edge graph.
    #[error("Parse error for '{path}': {reason}")]
    Parse { path: String, reason: String },
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl RelevanceError {
    pub fn read(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        RelevanceError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        RelevanceError::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<StripPrefixError> for RelevanceError {
    fn from(src: StripPrefixError) -> RelevanceError {
        RelevanceError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for RelevanceError {
    fn from(src: toml::de::Error) -> RelevanceError {
        RelevanceError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for RelevanceError {
    fn from(src: toml::ser::Error) -> RelevanceError {
        RelevanceError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for RelevanceError {
    fn from(src: JsonError) -> RelevanceError {
        RelevanceError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for RelevanceError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => RelevanceError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => RelevanceError::PermissionDenied,
            _ => RelevanceError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for RelevanceError {
    fn from(x: walkdir::Error) -> Self {
        match x.into_io_error() {
            Some(io_error) => RelevanceError::from(io_error),
            None => RelevanceError::Io("walkdir: filesystem loop detected".to_string()),
        }
    }
}

impl From<RegexError> for RelevanceError {
    fn from(x: RegexError) -> Self {
        RelevanceError::InvalidPattern(format!("Regex parse failed: {x}"))
    }
}
