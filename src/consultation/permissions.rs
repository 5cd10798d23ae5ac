//! Derived authorization for consultation operations.
//!
//! [`capabilities`] is the single source of truth consulted before every
//! mutating operation. Callers must never infer permissions from the
//! presence or absence of record fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::Status;

/// A mutating operation that must pass the permission gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Edit,
    Delete,
    Close,
    GenerateQuotation,
    AddFollowUp,
    UpdateFeasibility,
    /// Recording that the external quotation workflow rejected the
    /// linked quotation. Not user-initiated, but gated all the same.
    RecordRejection,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Edit => write!(f, "edit"),
            Action::Delete => write!(f, "delete"),
            Action::Close => write!(f, "close"),
            Action::GenerateQuotation => write!(f, "generate-quotation"),
            Action::AddFollowUp => write!(f, "add-follow-up"),
            Action::UpdateFeasibility => write!(f, "update-feasibility"),
            Action::RecordRejection => write!(f, "record-rejection"),
        }
    }
}

/// Raised when an operation is attempted while its capability is false.
///
/// A guard violation is resolved entirely client-side: it never produces
/// a store call and leaves the record untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("operation '{action}' is not permitted while status is '{status}'")]
pub struct GuardViolation {
    pub action: Action,
    pub status: Status,
}

/// The set of operations legal for a record in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_close: bool,
    pub can_generate_quotation: bool,
    pub can_add_follow_up: bool,
    pub can_update_feasibility: bool,
    pub can_record_rejection: bool,
}

/// Compute the capability set for a record from its status and whether a
/// quotation is already linked.
///
/// Pure and total: the match covers every status, so the transition table
/// cannot silently drift out of sync with a new status variant.
pub fn capabilities(status: Status, has_quotation: bool) -> Capabilities {
    let mutable = match status {
        Status::Pending | Status::Following => true,
        Status::Quoted | Status::Rejected | Status::Closed => false,
    };

    Capabilities {
        can_edit: mutable,
        can_delete: status == Status::Pending,
        can_close: mutable,
        can_generate_quotation: status == Status::Following && !has_quotation,
        can_add_follow_up: mutable,
        can_update_feasibility: !status.is_terminal(),
        can_record_rejection: status == Status::Quoted,
    }
}

impl Capabilities {
    /// Check a single action against this capability set.
    pub fn require(&self, action: Action, status: Status) -> Result<(), GuardViolation> {
        let allowed = match action {
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
            Action::Close => self.can_close,
            Action::GenerateQuotation => self.can_generate_quotation,
            Action::AddFollowUp => self.can_add_follow_up,
            Action::UpdateFeasibility => self.can_update_feasibility,
            Action::RecordRejection => self.can_record_rejection,
        };
        if allowed {
            Ok(())
        } else {
            Err(GuardViolation { action, status })
        }
    }
}
