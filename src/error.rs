use thiserror::Error;

use crate::consultation::{GuardViolation, ValidationError};
use crate::store::StoreError;

/// Top-level error taxonomy.
///
/// `Guard` and `Validation` are resolved entirely client-side and never
/// produce a network call. `Store` failures surface once at the call site
/// and are not retried. `Conflict` means remote state advanced past what
/// the caller last observed; the remedy is refetch-and-retry, never a
/// blind overwrite.
#[derive(Debug, Error)]
pub enum LabflowError {
    #[error(transparent)]
    Guard(#[from] GuardViolation),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("record was modified by another caller; refresh and retry")]
    Conflict,

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("consultation {0} is not in the local collection; refresh first")]
    NotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<StoreError> for LabflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => LabflowError::Conflict,
            other => LabflowError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::{Action, Status};

    #[test]
    fn guard_violation_message_passes_through() {
        let err: LabflowError = GuardViolation {
            action: Action::Delete,
            status: Status::Following,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "operation 'delete' is not permitted while status is 'following'"
        );
    }

    #[test]
    fn store_conflict_becomes_conflict() {
        let err: LabflowError = StoreError::Conflict.into();
        assert!(matches!(err, LabflowError::Conflict));
    }

    #[test]
    fn other_store_errors_stay_store() {
        let err: LabflowError = StoreError::Api {
            code: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, LabflowError::Store(_)));
    }
}
