use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("advertiser \"{advertiser}\" already exists")]
    DuplicateAdvertiser { advertiser: String },

    #[error("client {id} not found")]
    NotFound { id: String },

    #[error("stored data under \"{key}\" is corrupt: {reason}")]
    CorruptState { key: String, reason: String },

    #[error("stored schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i64, supported: u8 },

    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        ClientError::CorruptState {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the one error a user is expected to see and correct.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ClientError::DuplicateAdvertiser { .. })
    }
}
