//! Error taxonomy shared across the tile-server workspace.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Primary error type for tile operations.
///
/// Clone is required so a single fill outcome can be published to every
/// waiter of an in-flight generation.
#[derive(Debug, Clone, Error)]
pub enum TileError {
    // === Invalid input (client error, no retry) ===
    #[error("invalid extent: {0}")]
    InvalidExtent(String),

    #[error("invalid feature class list: {0}")]
    InvalidFeatureClassList(String),

    #[error("tile address kind mismatch: expected {expected}, got {actual}")]
    InvalidAddressKind {
        expected: &'static str,
        actual: String,
    },

    #[error("invalid scale range: {0}")]
    InvalidScaleRange(String),

    // === Not found (client-facing, no retry) ===
    #[error("feature class not found: {0}")]
    FeatureClassNotFound(String),

    #[error("attribute '{attribute}' is not defined on feature class '{feature_class}'")]
    AttributeNotFound {
        feature_class: String,
        attribute: String,
    },

    #[error("no map project with syscode {0}")]
    ProjectNotFound(i64),

    #[error("tile not found: {0}")]
    TileNotFound(String),

    // === Unavailable (transient; caller may retry the whole attempt) ===
    #[error("storage error: {0}")]
    Storage(String),

    #[error("repository error: {0}")]
    Repository(String),

    // === Everything else ===
    #[error("internal error: {0}")]
    Internal(String),
}

impl TileError {
    /// The HTTP status code the serving layer maps this error to.
    pub fn http_status_code(&self) -> u16 {
        match self {
            TileError::InvalidExtent(_)
            | TileError::InvalidFeatureClassList(_)
            | TileError::InvalidAddressKind { .. }
            | TileError::InvalidScaleRange(_) => 400,

            TileError::FeatureClassNotFound(_)
            | TileError::AttributeNotFound { .. }
            | TileError::ProjectNotFound(_)
            | TileError::TileNotFound(_) => 404,

            TileError::Storage(_) | TileError::Repository(_) => 503,

            TileError::Internal(_) => 500,
        }
    }

    /// Whether retrying the whole operation can succeed. Generation is
    /// idempotent against a fixed database snapshot, so transient failures
    /// are safe to retry at the caller.
    pub fn is_transient(&self) -> bool {
        matches!(self, TileError::Storage(_) | TileError::Repository(_))
    }
}

impl From<serde_json::Error> for TileError {
    fn from(err: serde_json::Error) -> Self {
        TileError::Internal(format!("JSON error: {err}"))
    }
}
