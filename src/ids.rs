use std::time::{SystemTime, UNIX_EPOCH};

use aes_gcm::aead::{rand_core::RngCore, OsRng};

pub(crate) fn now_string() -> String {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    ms.to_string()
}

/// Generates record ids shaped `cl-<millis>-<seq>-<hex>`.
///
/// The sequence number makes ids from one generator distinct even when the
/// clock has not advanced; the random suffix separates generators.
#[derive(Debug, Default)]
pub struct IdGenerator {
    seq: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        let mut bytes = [0_u8; 8];
        OsRng.fill_bytes(&mut bytes);
        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            hex.push_str(format!("{:02x}", b).as_str());
        }
        format!("cl-{}-{}-{hex}", now_string(), self.seq)
    }
}
