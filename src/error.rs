/// Centralized error types for repo-index using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the indexing pipeline
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors related to change detection
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("git diff failed ({status}): {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding client: {0}")]
    InitializationFailed(String),

    #[error("Embedding request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to vector store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to initialize vector store client: {0}")]
    InitializationFailed(String),

    #[error("Vector store request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Invalid vector store response: {0}")]
    InvalidResponse(String),
}

// Conversion from anyhow::Error to IndexError
impl From<anyhow::Error> for IndexError {
    fn from(err: anyhow::Error) -> Self {
        IndexError::Other(format!("{:#}", err))
    }
}

impl IndexError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        IndexError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexError::Config(ConfigError::MissingRequired("GEMINI_API_KEY".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required configuration: GEMINI_API_KEY"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: IndexError = io_err.into();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let err: IndexError = anyhow_err.into();
        assert!(matches!(err, IndexError::Other(_)));
    }

    #[test]
    fn test_embedding_error_dimension_mismatch() {
        let err = EmbeddingError::DimensionMismatch {
            expected: 512,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Invalid embedding dimension: expected 512, got 768"
        );
    }

    #[test]
    fn test_git_error_command_failed() {
        let err = GitError::CommandFailed {
            status: "exit status: 128".to_string(),
            stderr: "fatal: bad revision".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "git diff failed (exit status: 128): fatal: bad revision"
        );
    }

    #[test]
    fn test_store_error_request_failed() {
        let err = StoreError::RequestFailed {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Vector store request failed (429): rate limited"
        );
    }

    #[test]
    fn test_error_chain() {
        let embedding_err = EmbeddingError::InvalidResponse("missing values".to_string());
        let err: IndexError = embedding_err.into();
        assert_eq!(
            err.to_string(),
            "Embedding error: Invalid embedding response: missing values"
        );
    }
}
