use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteDownError {
    /// A value that cannot be turned into a callable was used as one.
    #[error("Not a callable (expected a closure, method or method name): {0}")]
    InvalidCallableKind(String),

    #[error("Undefined method `{0}`")]
    UndefinedMethod(String),

    #[error("Invalid argument for `{method}`: {reason}")]
    InvalidArgument { method: String, reason: String },

    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    #[error("Adapter already initialized with backend `{0}`")]
    AlreadyInitialized(String),

    #[error("Adapter not initialized")]
    NotInitialized,

    #[error("The {backend} backend does not support {operation}")]
    NotSupported {
        backend: &'static str,
        operation: &'static str,
    },

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Note {0} is already archived")]
    AlreadyArchived(String),

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid regex: {0}")]
    Regex(#[from] regex::Error),
}

impl WriteDownError {
    pub fn not_supported(backend: &'static str, operation: &'static str) -> Self {
        WriteDownError::NotSupported { backend, operation }
    }

    pub fn invalid_argument(method: impl Into<String>, reason: impl Into<String>) -> Self {
        WriteDownError::InvalidArgument {
            method: method.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WriteDownError>;
