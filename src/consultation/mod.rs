mod permissions;
mod quotation;
mod record;
mod status;

pub use permissions::{Action, Capabilities, GuardViolation, capabilities};
pub use quotation::QuotationNumberer;
pub use record::{
    ConsultationDraft, ConsultationRecord, Feasibility, FieldPatch, FollowUpDraft, FollowUpKind,
    ValidationError,
};
pub use status::Status;

#[cfg(test)]
pub(crate) use record::tests::sample_record;
