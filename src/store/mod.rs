pub mod client;
pub mod error;
pub mod memory;
pub mod types;

pub use client::ConsultationStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use types::{ConsultationQuery, Page, QuotationRef};

use crate::consultation::{ConsultationDraft, ConsultationRecord, Feasibility, FollowUpDraft};

/// The remote consultation store, as seen by the engine.
///
/// Every mutating call is fire-and-acknowledge: `Ok` means the store has
/// durably applied the change, and the engine then re-fetches the record
/// to reconcile. `Err` means nothing was applied locally.
pub trait ConsultationApi {
    async fn page(
        &self,
        query: &ConsultationQuery,
    ) -> Result<Page<ConsultationRecord>, StoreError>;

    async fn get(&self, id: i64) -> Result<ConsultationRecord, StoreError>;

    async fn create(&self, draft: &ConsultationDraft) -> Result<ConsultationRecord, StoreError>;

    /// Full-record update; the store checks the embedded version token.
    async fn update(&self, record: &ConsultationRecord) -> Result<(), StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    async fn close(&self, id: i64) -> Result<(), StoreError>;

    async fn add_follow_up(&self, id: i64, draft: &FollowUpDraft) -> Result<(), StoreError>;

    async fn set_feasibility(
        &self,
        id: i64,
        feasibility: Feasibility,
        note: Option<&str>,
        estimated_price: Option<f64>,
    ) -> Result<(), StoreError>;

    async fn link_quotation(
        &self,
        id: i64,
        quotation_id: i64,
        quotation_no: &str,
    ) -> Result<(), StoreError>;
}

/// The external quotation subsystem.
///
/// Given a consultation and a synthesized number, it creates the
/// quotation entity and returns the real id. The engine never commits a
/// provisional quotation id; linkage waits for this call to succeed.
pub trait QuotationService {
    async fn create_quotation(
        &self,
        record: &ConsultationRecord,
        quotation_no: &str,
    ) -> Result<QuotationRef, StoreError>;
}
