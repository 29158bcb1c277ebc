//! Sealing of stored client lists.
//!
//! Each storage key holds one self-describing envelope: AES-256-GCM over the
//! serialized list, with the PBKDF2 salt stored next to it so any process
//! knowing the password can reopen the file.

use aes_gcm::aead::{rand_core::RngCore, Aead, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{ClientError, Result};

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 200_000;
const ENVELOPE_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const TAG_LEN: usize = 16;
const IV_LEN: usize = 12;

pub type DerivedKey = [u8; 32];

/// Envelope written under one storage key. Byte fields are base64 and the
/// GCM tag is stored apart from the ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoEnvelope {
    pub v: u8,
    pub salt: String,
    pub iv: String,
    pub tag: String,
    pub data: String,
}

impl CryptoEnvelope {
    pub fn seal(plaintext: &str, salt: &[u8], key: &DerivedKey) -> Result<Self> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let mut sealed = cipher(key)
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|err| ClientError::Crypto(err.to_string()))?;
        let Some(body_len) = sealed.len().checked_sub(TAG_LEN) else {
            return Err(ClientError::Crypto("sealed output shorter than its tag".to_string()));
        };
        let tag = sealed.split_off(body_len);

        Ok(Self {
            v: ENVELOPE_VERSION,
            salt: B64.encode(salt),
            iv: B64.encode(iv),
            tag: B64.encode(tag),
            data: B64.encode(sealed),
        })
    }

    /// Salt the key for this envelope must be derived from.
    pub fn salt_bytes(&self) -> Option<Vec<u8>> {
        B64.decode(self.salt.as_str()).ok().filter(|salt| !salt.is_empty())
    }

    /// `None` when the envelope is malformed, was tampered with, or `key`
    /// is not the one it was sealed with.
    pub fn open(&self, key: &DerivedKey) -> Option<String> {
        if self.v != ENVELOPE_VERSION {
            return None;
        }
        let iv = B64.decode(self.iv.as_str()).ok().filter(|iv| iv.len() == IV_LEN)?;
        let tag = B64.decode(self.tag.as_str()).ok().filter(|tag| tag.len() == TAG_LEN)?;
        let mut sealed = B64.decode(self.data.as_str()).ok()?;
        sealed.extend_from_slice(tag.as_slice());

        let plain = cipher(key)
            .decrypt(Nonce::from_slice(iv.as_slice()), sealed.as_slice())
            .ok()?;
        String::from_utf8(plain).ok()
    }
}

pub fn derive_key(password: &str, salt: &[u8], iterations: u32) -> DerivedKey {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations.max(1), &mut key);
    key
}

pub fn fresh_salt() -> Vec<u8> {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng.fill_bytes(salt.as_mut_slice());
    salt
}

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()))
}
