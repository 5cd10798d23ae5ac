use std::fmt;

use serde::{Deserialize, Serialize};

/// The five statuses of a consultation's lifecycle.
///
/// A record is created in `Pending` (or directly in `Following` when a
/// follower is assigned at creation) and ends in exactly one of the
/// terminal statuses: `Quoted`, `Rejected` or `Closed`. No transition
/// ever returns a record to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Following,
    Quoted,
    Rejected,
    Closed,
}

impl Status {
    /// Terminal statuses absorb: no lifecycle event is legal from them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Quoted | Status::Rejected | Status::Closed)
    }

    /// Mutable statuses admit field edits, follow-ups and closing.
    pub fn is_mutable(self) -> bool {
        matches!(self, Status::Pending | Status::Following)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Following => write!(f, "following"),
            Status::Quoted => write!(f, "quoted"),
            Status::Rejected => write!(f, "rejected"),
            Status::Closed => write!(f, "closed"),
        }
    }
}
