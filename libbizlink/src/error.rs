//! Error types for Bizlink

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BizlinkError>;

#[derive(Error, Debug)]
pub enum BizlinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Secure storage error: {0}")]
    SecureStore(#[from] SecureStoreError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BizlinkError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BizlinkError::InvalidInput(_) => 3,
            BizlinkError::Api(e) if e.is_auth_failure() => 2,
            BizlinkError::Api(_) => 1,
            BizlinkError::Config(_) => 1,
            BizlinkError::Storage(_) => 1,
            BizlinkError::SecureStore(_) => 1,
        }
    }

    /// Collapse the error into the single message a store keeps in its
    /// `error` field.
    ///
    /// Server-provided messages win; transport failures and message-less
    /// rejections fall back to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            BizlinkError::InvalidInput(message) => message.clone(),
            BizlinkError::Api(e) => e.user_message(fallback),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SecureStoreError {
    #[error("OS keyring unavailable: {0}")]
    KeyringUnavailable(String),

    #[error("Keyring operation failed: {0}")]
    Keyring(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: wrong master password or corrupted file")]
    DecryptionFailed,

    #[error("Master password must be at least 8 characters")]
    WeakPassword,

    #[error("Master password not set")]
    MasterPasswordNotSet,

    #[error("No secure storage backend available")]
    NoStoreAvailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced at the service boundary
///
/// Transport failures and schema mismatches are kept apart so callers can
/// tell a dead network from a backend that answered with something
/// unexpected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request failed with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("Invalid response format: {0}")]
    Decode(String),

    #[error("Authentication token not found")]
    Unauthenticated,
}

impl ApiError {
    /// HTTP status code, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for missing tokens and 401/403 responses
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            ApiError::Unauthenticated | ApiError::Status { status: 401 | 403, .. }
        )
    }

    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ApiError::Decode(_) => "Invalid response format".to_string(),
            ApiError::Unauthenticated => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}
