//! Reading policy and repository documents from disk
//!
//! Documents are JSON unless the file extension is `.yaml` or `.yml`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::Result;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => DocumentFormat::Yaml,
            _ => DocumentFormat::Json,
        }
    }

    /// Parse `data` in this format.
    pub fn parse<T: DeserializeOwned>(self, data: &str) -> Result<T> {
        match self {
            DocumentFormat::Json => Ok(serde_json::from_str(data)?),
            DocumentFormat::Yaml => Ok(serde_yaml::from_str(data)?),
        }
    }
}

/// Read and parse the document at `path`.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read_to_string(path)?;
    DocumentFormat::from_path(path).parse(&data)
}
