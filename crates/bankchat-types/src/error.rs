use thiserror::Error;

/// Top-level error taxonomy for a chat turn.
///
/// Every lower-level error folds into one of these variants before it reaches
/// the network boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ChatError {
    /// Invalid or expired token. The two cases are never distinguished.
    #[error("unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    /// Missing or invalid parameters, in the order they should be asked for.
    #[error("missing or invalid parameters: {}", missing.join(", "))]
    ValidationFailed { missing: Vec<String> },

    #[error("upstream generator unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors from the token session store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Token absent or expired.
    #[error("invalid session token")]
    Invalid,

    #[error("active session limit of {limit} reached")]
    LimitReached { limit: usize },
}

/// Errors from the banking collaborator stores.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient funds: available {available:.2}, required {required:.2}")]
    InsufficientFunds { available: f64, required: f64 },

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Errors from the upstream text generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("cannot connect to generator: {0}")]
    Connect(String),

    #[error("generator model not found: {0}")]
    ModelNotFound(String),

    #[error("generator server error: {0}")]
    Server(String),

    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode generator output: {0}")]
    Decode(String),

    #[error("generation timed out after {0}s")]
    Timeout(u64),
}

impl From<SessionError> for ChatError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Invalid => ChatError::Unauthorized,
            SessionError::LimitReached { .. } => ChatError::Unavailable(e.to_string()),
        }
    }
}

impl From<GenerationError> for ChatError {
    fn from(e: GenerationError) -> Self {
        ChatError::UpstreamUnavailable(e.to_string())
    }
}

impl From<StoreError> for ChatError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ChatError::NotFound(what),
            other => ChatError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_lists_missing_in_order() {
        let err = ChatError::ValidationFailed {
            missing: vec!["amount".to_string(), "method".to_string()],
        };
        assert_eq!(err.to_string(), "missing or invalid parameters: amount, method");
    }

    #[test]
    fn test_session_errors_fold_into_unauthorized() {
        assert_eq!(ChatError::from(SessionError::Invalid), ChatError::Unauthorized);
        let err = ChatError::from(SessionError::LimitReached { limit: 3 });
        assert!(matches!(err, ChatError::Unavailable(msg) if msg.contains('3')));
    }

    #[test]
    fn test_generation_error_becomes_upstream_unavailable() {
        let err = ChatError::from(GenerationError::ModelNotFound("llama3".to_string()));
        assert_eq!(
            err.to_string(),
            "upstream generator unavailable: generator model not found: llama3"
        );
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::InsufficientFunds {
            available: 100.0,
            required: 250.5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds: available 100.00, required 250.50"
        );
    }
}
