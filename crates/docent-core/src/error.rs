//! Error types for docent operations.
//!
//! Errors carry a structured [`ErrorCode`] so the HTTP layer and callers can
//! branch on the failure class without string matching. Only collaborator
//! failures (vector store, embedding service, document source) are surfaced
//! from retrieval; degradations such as a missing reranker are logged and
//! absorbed where they happen.

use thiserror::Error;

/// Result type alias for docent operations.
pub type DocentResult<T> = Result<T, DocentError>;

/// Main error type for all docent operations.
#[derive(Error, Debug)]
pub enum DocentError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        suggestion: Option<String>,
    },

    /// Vector store or document source operation failed.
    #[error("Vector store error: {message}")]
    VectorStore {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding generation failed.
    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cross-encoder scoring failed.
    #[error("Reranker error: {message}")]
    Reranker { message: String, code: ErrorCode },

    /// Conversation store operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network error.
    #[error("Network error: {message}")]
    Network {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider not supported.
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation (VAL_xxx)
    ValInvalidInput,
    ValInvalidConfig,

    // Vector Store (VEC_xxx)
    VecConnectionFailed,
    VecOperationFailed,
    VecCollectionNotFound,

    // Embedding (EMB_xxx)
    EmbConnectionFailed,
    EmbGenerationFailed,
    EmbShapeMismatch,

    // Reranker (RRK_xxx)
    RrkScoringFailed,

    // Database (DB_xxx)
    DbOperationFailed,

    // Network (NET_xxx)
    NetConnectionFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,
    ParseInvalidTimestamp,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValInvalidConfig => "VAL_002",
            ErrorCode::VecConnectionFailed => "VEC_001",
            ErrorCode::VecOperationFailed => "VEC_002",
            ErrorCode::VecCollectionNotFound => "VEC_003",
            ErrorCode::EmbConnectionFailed => "EMB_001",
            ErrorCode::EmbGenerationFailed => "EMB_002",
            ErrorCode::EmbShapeMismatch => "EMB_003",
            ErrorCode::RrkScoringFailed => "RRK_001",
            ErrorCode::DbOperationFailed => "DB_001",
            ErrorCode::NetConnectionFailed => "NET_001",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::ParseInvalidTimestamp => "PARSE_002",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl DocentError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            suggestion: None,
        }
    }

    /// Create a configuration validation error with a suggestion.
    pub fn invalid_config(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidConfig,
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a vector store error.
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore {
            message: message.into(),
            code: ErrorCode::VecOperationFailed,
            source: None,
        }
    }

    /// Create a "collection not found" vector store error.
    pub fn collection_not_found(name: impl Into<String>) -> Self {
        Self::VectorStore {
            message: format!("Collection '{}' not found", name.into()),
            code: ErrorCode::VecCollectionNotFound,
            source: None,
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            code: ErrorCode::EmbGenerationFailed,
            source: None,
        }
    }

    /// Create an embedding shape mismatch error.
    pub fn embedding_shape(expected: usize, actual: usize) -> Self {
        Self::Embedding {
            message: format!("Expected {} embeddings, got {}", expected, actual),
            code: ErrorCode::EmbShapeMismatch,
            source: None,
        }
    }

    /// Create a reranker error.
    pub fn reranker(message: impl Into<String>) -> Self {
        Self::Reranker {
            message: message.into(),
            code: ErrorCode::RrkScoringFailed,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            code: ErrorCode::NetConnectionFailed,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { code, .. } => *code,
            Self::VectorStore { code, .. } => *code,
            Self::Embedding { code, .. } => *code,
            Self::Reranker { code, .. } => *code,
            Self::Database { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            Self::Configuration(_) => ErrorCode::ValInvalidConfig,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::VectorStore { .. } => Some("Please check your vector store connection settings"),
            Self::Embedding { .. } => Some("Please check your embedding provider configuration"),
            Self::Reranker { .. } => Some("Please check your reranker endpoint and model"),
            _ => None,
        }
    }

    /// Whether the failure came from an external collaborator call.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::VectorStore { .. } | Self::Embedding { .. } | Self::Network { .. } | Self::Reranker { .. }
        )
    }
}

impl From<rusqlite::Error> for DocentError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            code: ErrorCode::DbOperationFailed,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DocentError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_invalid_config_carries_suggestion() {
        let err = DocentError::invalid_config("dense_k < top_k", "raise dense_k");
        assert_eq!(err.code(), ErrorCode::ValInvalidConfig);
        assert_eq!(err.suggestion(), Some("raise dense_k"));
    }

    #[test]
    fn test_external_classification() {
        assert!(DocentError::vector_store("down").is_external());
        assert!(DocentError::embedding("down").is_external());
        assert!(!DocentError::validation("bad").is_external());
        assert!(!DocentError::Configuration("bad".into()).is_external());
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::VecCollectionNotFound.as_str(), "VEC_003");
        assert_eq!(DocentError::embedding_shape(3, 2).code().as_str(), "EMB_003");
    }
}
