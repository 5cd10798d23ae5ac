//! Error types for the consultation store client.
//!
//! [`StoreError`] covers the failure shapes of the remote store: an
//! envelope-level rejection, a non-success HTTP status, a stale version
//! token, and network-layer failures. Store failures are never retried
//! automatically; the caller surfaces them once and leaves local state
//! untouched.

use thiserror::Error;

/// Errors returned by the remote consultation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The envelope carried a non-success business code.
    #[error("store rejected the request (code {code}): {message}")]
    Api { code: i32, message: String },

    /// The HTTP layer returned a non-success status outside the envelope.
    #[error("HTTP error (status {status}): {message}")]
    Http { status: u16, message: String },

    /// The caller's version token is stale; re-fetch and retry.
    #[error("record was modified by another caller; refresh and retry")]
    Conflict,

    /// A success envelope arrived without the payload the caller needs.
    #[error("store response is missing its payload")]
    MissingData,

    /// Underlying network failure (DNS, connection refused, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = StoreError::Api {
            code: 500,
            message: "internal error".into(),
        };
        assert_eq!(
            err.to_string(),
            "store rejected the request (code 500): internal error"
        );
    }

    #[test]
    fn conflict_display_prompts_refresh() {
        assert!(StoreError::Conflict.to_string().contains("refresh and retry"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StoreError>();
    }
}
