//! Key-value persistence backends.
//!
//! The store only ever needs string values under string keys, the same
//! contract browser local storage offers.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::crypto::{derive_key, fresh_salt, CryptoEnvelope, DerivedKey};
use crate::error::{ClientError, Result};

pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces whatever was stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    extension: &'static str,
}

impl FileStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_extension(root.into(), "json")
    }

    fn open_with_extension(root: PathBuf, extension: &'static str) -> Result<Self> {
        fs::create_dir_all(root.as_path())?;
        Ok(Self { root, extension })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let name = sanitize_key(key)?;
        Ok(self.root.join(format!("{name}.{}", self.extension)))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(path.as_path()) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ClientError::Storage(format!(
                "failed to read {}: {err}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        write_text_file(path.as_path(), value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path.as_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ClientError::Storage(format!(
                "failed to remove {}: {err}",
                path.display()
            ))),
        }
    }
}

/// File storage whose values are sealed with AES-256-GCM under a
/// PBKDF2-derived key.
pub struct EncryptedFileStorage {
    files: FileStorage,
    password: String,
    iterations: u32,
    derived: RefCell<Option<(Vec<u8>, DerivedKey)>>,
}

impl EncryptedFileStorage {
    pub fn open(root: impl Into<PathBuf>, password: &str, iterations: u32) -> Result<Self> {
        if password.is_empty() {
            return Err(ClientError::Config(
                "encryption password must not be empty".to_string(),
            ));
        }
        Ok(Self {
            files: FileStorage::open_with_extension(root.into(), "enc")?,
            password: password.to_string(),
            iterations,
            derived: RefCell::new(None),
        })
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        self.files.path_for(key)
    }

    fn key_for_salt(&self, salt: &[u8]) -> DerivedKey {
        if let Some((cached_salt, cached_key)) = self.derived.borrow().as_ref() {
            if cached_salt.as_slice() == salt {
                return *cached_key;
            }
        }
        let key = derive_key(self.password.as_str(), salt, self.iterations);
        *self.derived.borrow_mut() = Some((salt.to_vec(), key));
        key
    }
}

impl KeyValueStorage for EncryptedFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.files.get(key)? else {
            return Ok(None);
        };
        let envelope: CryptoEnvelope = serde_json::from_str(raw.as_str())
            .map_err(|err| ClientError::corrupt(key, format!("invalid envelope: {err}")))?;
        let Some(salt) = envelope.salt_bytes() else {
            return Err(ClientError::corrupt(key, "envelope salt is invalid"));
        };
        let derived = self.key_for_salt(salt.as_slice());
        match envelope.open(&derived) {
            Some(text) => Ok(Some(text)),
            None => Err(ClientError::corrupt(
                key,
                "unable to decrypt; wrong password or tampered data",
            )),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let cached = self.derived.borrow().clone();
        let (salt, derived) = match cached {
            Some(pair) => pair,
            None => {
                let salt = fresh_salt();
                let derived = self.key_for_salt(salt.as_slice());
                (salt, derived)
            }
        };
        let envelope = CryptoEnvelope::seal(value, salt.as_slice(), &derived)?;
        let content = serde_json::to_string(&envelope)?;
        self.files.set(key, content.as_str())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.files.remove(key)
    }
}

/// Maps a storage key onto a single safe file name.
fn sanitize_key(key: &str) -> Result<String> {
    let mut out = String::with_capacity(key.len());
    for ch in key.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches(|ch| ch == '_' || ch == '.');
    if trimmed.is_empty() {
        return Err(ClientError::Storage(format!("invalid storage key \"{key}\"")));
    }
    Ok(trimmed.to_string())
}

fn write_text_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(temp_path.as_path(), content)?;
    fs::rename(temp_path.as_path(), path)?;
    Ok(())
}
