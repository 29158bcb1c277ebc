use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::normalize::BOOTSTRAP_SOURCE;

/// Seed dataset consumed once, when nothing is persisted yet. Entries use the
/// upper-case keys and carry no ids.
pub trait BootstrapSource {
    fn raw_records(&self) -> Result<Vec<Value>>;
}

impl BootstrapSource for Vec<Value> {
    fn raw_records(&self) -> Result<Vec<Value>> {
        Ok(self.clone())
    }
}

impl BootstrapSource for [Value] {
    fn raw_records(&self) -> Result<Vec<Value>> {
        Ok(self.to_vec())
    }
}

/// Bootstrap data held as a JSON array string, e.g. from `include_str!`.
#[derive(Debug, Clone)]
pub struct JsonBootstrap {
    text: String,
}

impl JsonBootstrap {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(path.as_path()).map_err(|err| {
            ClientError::Storage(format!("failed to read {}: {err}", path.display()))
        })?;
        Ok(Self { text })
    }
}

impl BootstrapSource for JsonBootstrap {
    fn raw_records(&self) -> Result<Vec<Value>> {
        let parsed: Value = serde_json::from_str(self.text.as_str())
            .map_err(|err| ClientError::corrupt(BOOTSTRAP_SOURCE, format!("invalid JSON: {err}")))?;
        match parsed {
            Value::Array(entries) => Ok(entries),
            _ => Err(ClientError::corrupt(
                BOOTSTRAP_SOURCE,
                "expected an array of clients",
            )),
        }
    }
}
