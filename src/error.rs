//! Error types for health-intake.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Configuration and reference-data errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value storage backend errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

impl StorageError {
    /// The backend's message without the variant prefix.
    pub fn into_message(self) -> String {
        match self {
            Self::Open(msg) | Self::Query(msg) | Self::WriteRejected(msg) => msg,
        }
    }
}

/// Selection and step-validation errors.
///
/// Returned to the immediate caller; the session is never modified when one
/// of these is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardingError {
    #[error("Maximum selection reached ({max})")]
    LimitExceeded { max: usize },

    #[error("Invalid reorder: {reason}")]
    InvalidReorder { reason: String },

    #[error("Please answer all questions before proceeding (missing: {})", missing.join(", "))]
    IncompleteAnswers { missing: Vec<&'static str> },

    #[error("At least one selection is required on the {step} step")]
    SelectionRequired { step: &'static str },
}

/// Save/load protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("{0}")]
    WriteFailure(String),

    #[error("{0}")]
    ReadFailure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The session is not ready to be saved. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] OnboardingError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
