//! The consultation aggregate: descriptive fields, the append-only
//! follow-up ledger, the feasibility annotation and the quotation link.
//!
//! All lifecycle mutations go through the guarded methods on
//! [`ConsultationRecord`]. Each method re-checks the permission gate and
//! either applies the full change or leaves the record untouched.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::permissions::{Action, GuardViolation, capabilities};
use super::status::Status;

/// How a follow-up contact was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpKind {
    Phone,
    Email,
    Visit,
    Other,
}

impl std::fmt::Display for FollowUpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowUpKind::Phone => write!(f, "phone"),
            FollowUpKind::Email => write!(f, "email"),
            FollowUpKind::Visit => write!(f, "visit"),
            FollowUpKind::Other => write!(f, "other"),
        }
    }
}

/// A single entry in the follow-up ledger. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRecord {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: FollowUpKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    pub operator: String,
}

/// Evaluative verdict on whether the requested testing can be done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feasibility {
    Feasible,
    Difficult,
    Infeasible,
}

impl std::fmt::Display for Feasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feasibility::Feasible => write!(f, "feasible"),
            Feasibility::Difficult => write!(f, "difficult"),
            Feasibility::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Caller-supplied data that failed local shape checks. Never reaches
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError {
            field,
            message: "must not be empty".into(),
        })
    } else {
        Ok(())
    }
}

/// A sales-inquiry record tracked from first contact through follow-up
/// to quotation or closure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRecord {
    /// Store-assigned identity.
    pub id: i64,
    /// Human-facing number, assigned at creation, immutable.
    pub consultation_no: String,
    pub status: Status,
    pub company: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower: Option<String>,
    #[serde(default)]
    pub follow_up_records: Vec<FollowUpRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feasibility: Option<Feasibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feasibility_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
    /// Set together with `quotation_no`, never cleared afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotation_no: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_by: String,
    pub create_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic-concurrency token checked by the store on update.
    #[serde(default)]
    pub version: u64,
}

/// Payload for creating a new consultation. The store assigns the id and
/// the consultation number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDraft {
    pub company: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_items: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower: Option<String>,
    pub created_by: String,
}

impl ConsultationDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("company", &self.company)?;
        require_non_empty("contact", &self.contact)?;
        if let Some(budget) = self.budget
            && budget < 0.0
        {
            return Err(ValidationError {
                field: "budget",
                message: "must not be negative".into(),
            });
        }
        Ok(())
    }
}

/// Payload for one follow-up entry. The durable id is assigned when the
/// entry is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpDraft {
    #[serde(rename = "type")]
    pub kind: FollowUpKind,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action: Option<String>,
    pub operator: String,
}

impl FollowUpDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("content", &self.content)?;
        require_non_empty("operator", &self.operator)
    }

    /// Materialize the draft into a ledger entry with a fresh unique id.
    pub fn into_record(self, date: DateTime<Utc>) -> FollowUpRecord {
        FollowUpRecord {
            id: Uuid::new_v4(),
            date,
            kind: self.kind,
            content: self.content,
            next_action: self.next_action,
            operator: self.operator,
        }
    }
}

/// Descriptive-field updates applied as a unit. `None` leaves a field
/// unchanged.
///
/// `status` is the one non-descriptive field: it may only request the
/// explicit `pending → following` move. There is no automatic promotion
/// on follower assignment or first follow-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    pub status: Option<Status>,
    pub company: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub sample_description: Option<String>,
    pub test_items: Option<String>,
    pub urgency: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub follower: Option<String>,
}

impl FieldPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(company) = &self.company {
            require_non_empty("company", company)?;
        }
        if let Some(contact) = &self.contact {
            require_non_empty("contact", contact)?;
        }
        if let Some(budget) = self.budget
            && budget < 0.0
        {
            return Err(ValidationError {
                field: "budget",
                message: "must not be negative".into(),
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.company.is_none()
            && self.contact.is_none()
            && self.phone.is_none()
            && self.sample_description.is_none()
            && self.test_items.is_none()
            && self.urgency.is_none()
            && self.deadline.is_none()
            && self.budget.is_none()
            && self.follower.is_none()
    }
}

impl ConsultationRecord {
    fn gate(&self, action: Action) -> Result<(), GuardViolation> {
        capabilities(self.status, self.quotation_no.is_some()).require(action, self.status)
    }

    /// Advance `updated_at` and the version token. `updated_at` strictly
    /// increases even when the wall clock has not moved between calls.
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
        self.version += 1;
    }

    /// Apply a descriptive-field patch. Legal while the status is mutable.
    /// A requested status change is accepted only for `pending → following`
    /// (or a no-op re-statement of the current status).
    pub fn apply_fields(&mut self, patch: &FieldPatch) -> Result<(), GuardViolation> {
        self.gate(Action::Edit)?;
        if let Some(target) = patch.status {
            let legal = target == self.status
                || (self.status == Status::Pending && target == Status::Following);
            if !legal {
                return Err(GuardViolation {
                    action: Action::Edit,
                    status: self.status,
                });
            }
            self.status = target;
        }
        if let Some(company) = &patch.company {
            self.company = company.clone();
        }
        if let Some(contact) = &patch.contact {
            self.contact = contact.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(sample) = &patch.sample_description {
            self.sample_description = Some(sample.clone());
        }
        if let Some(items) = &patch.test_items {
            self.test_items = Some(items.clone());
        }
        if let Some(urgency) = &patch.urgency {
            self.urgency = Some(urgency.clone());
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(budget) = patch.budget {
            self.budget = Some(budget);
        }
        if let Some(follower) = &patch.follower {
            self.follower = Some(follower.clone());
        }
        self.touch();
        Ok(())
    }

    /// Append one entry to the follow-up ledger, preserving call order.
    /// Existing entries are never reordered, mutated or removed.
    pub fn append_follow_up(&mut self, entry: FollowUpRecord) -> Result<(), GuardViolation> {
        self.gate(Action::AddFollowUp)?;
        self.follow_up_records.push(entry);
        self.touch();
        Ok(())
    }

    /// Replace the feasibility triple as a unit. Last write wins; no
    /// history of prior assessments is kept.
    pub fn set_feasibility(
        &mut self,
        feasibility: Feasibility,
        note: Option<String>,
        estimated_price: Option<f64>,
    ) -> Result<(), GuardViolation> {
        self.gate(Action::UpdateFeasibility)?;
        self.feasibility = Some(feasibility);
        self.feasibility_note = note;
        self.estimated_price = estimated_price;
        self.touch();
        Ok(())
    }

    /// Close the consultation. Terminal.
    pub fn close(&mut self) -> Result<(), GuardViolation> {
        self.gate(Action::Close)?;
        self.status = Status::Closed;
        self.touch();
        Ok(())
    }

    /// Link the generated quotation and move to `Quoted`. Legal only from
    /// `Following` with no quotation yet; irreversible — there is no
    /// unlink operation.
    pub fn link_quotation(
        &mut self,
        quotation_id: i64,
        quotation_no: &str,
    ) -> Result<(), GuardViolation> {
        self.gate(Action::GenerateQuotation)?;
        self.status = Status::Quoted;
        self.quotation_id = Some(quotation_id);
        self.quotation_no = Some(quotation_no.to_string());
        self.touch();
        Ok(())
    }

    /// Record the quotation's rejection. Driven by the external quotation
    /// workflow; legal only from `Quoted`. The quotation link survives.
    pub fn quotation_rejected(&mut self) -> Result<(), GuardViolation> {
        self.gate(Action::RecordRejection)?;
        self.status = Status::Rejected;
        self.touch();
        Ok(())
    }

    /// Whether the record may be physically deleted.
    pub fn deletable(&self) -> bool {
        capabilities(self.status, self.quotation_no.is_some()).can_delete
    }
}
