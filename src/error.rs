use thiserror::Error;

/// Failures raised by a [`crate::store::KeyValueStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("encryption failed: {0}")]
    Crypto(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single field that failed its module's input rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to persist `{key}`: {source}")]
    Persistence {
        key: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("failed to encode `{key}`: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl CollectionError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CollectionError::Validation(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("cannot convert {from} to {to}")]
    UnitMismatch { from: String, to: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("file storage requires a root directory")]
    MissingRoot,
    #[error("encrypted storage requires POCKETDESK_PASSPHRASE")]
    MissingPassphrase,
}

/// Stored collection text that could not be read back. Always recovered
/// locally by treating the collection as empty.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}
