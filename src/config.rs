use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::crypto::DEFAULT_PBKDF2_ITERATIONS;
use crate::error::{ClientError, Result};
use crate::storage::{EncryptedFileStorage, FileStorage, KeyValueStorage};
use crate::store::DEFAULT_STORAGE_KEY;

pub const APP_DIR_NAME: &str = "KinessoClients";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub storage_key: String,
    /// Falls back to `<platform data dir>/KinessoClients` when unset.
    pub data_dir: Option<PathBuf>,
    /// Also write the upper-case keys for readers of the original schema.
    pub write_legacy_keys: bool,
    pub notify_duration_ms: u64,
    pub encryption_password: Option<String>,
    pub pbkdf2_iterations: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
            write_legacy_keys: true,
            notify_duration_ms: 3000,
            encryption_password: None,
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig =
            toml::from_str(text).map_err(|err| ClientError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(text.as_str()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ClientError::Config(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(ClientError::Config("storage_key must not be empty".to_string()));
        }
        if self
            .encryption_password
            .as_deref()
            .is_some_and(|password| password.is_empty())
        {
            return Err(ClientError::Config(
                "encryption_password must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|base| base.join(APP_DIR_NAME))
            .ok_or_else(|| ClientError::Config("no platform data directory available".to_string()))
    }

    pub fn notify_duration(&self) -> Duration {
        Duration::from_millis(self.notify_duration_ms)
    }

    /// Builds the configured backend: encrypted when a password is set.
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStorage>> {
        let root = self.resolve_data_dir()?;
        match self.encryption_password.as_deref() {
            Some(password) => Ok(Box::new(EncryptedFileStorage::open(
                root,
                password,
                self.pbkdf2_iterations,
            )?)),
            None => Ok(Box::new(FileStorage::open(root)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.storage_key, "clientesKinesso");
        assert_eq!(config.notify_duration(), Duration::from_secs(3));
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = StoreConfig::from_toml_str(
            r#"
            storage_key = "clientesKinessoTest"
            data_dir = "/tmp/kinesso"
            write_legacy_keys = false
            pbkdf2_iterations = 1000
            "#,
        )
        .unwrap();
        assert_eq!(config.storage_key, "clientesKinessoTest");
        assert_eq!(config.resolve_data_dir().unwrap(), PathBuf::from("/tmp/kinesso"));
        assert!(!config.write_legacy_keys);
        assert_eq!(config.pbkdf2_iterations, 1000);
        assert_eq!(config.notify_duration_ms, 3000);
    }

    #[test]
    fn blank_key_and_empty_password_are_rejected() {
        assert!(StoreConfig::from_toml_str("storage_key = \"  \"").is_err());
        assert!(StoreConfig::from_toml_str("encryption_password = \"\"").is_err());
        assert!(StoreConfig::from_toml_str("notify_duration_ms = \"soon\"").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = StoreConfig::load(Path::new("/definitely/not/here/kinesso.toml")).unwrap();
        assert_eq!(config, StoreConfig::default());
    }
}
