//! The consultation engine: permission gate, store calls and local
//! reconciliation under one policy.
//!
//! Every mutating operation follows the same sequence — look up the local
//! record, check the gate, validate caller data, issue the store call,
//! then reconcile the acknowledged result. The local collection is never
//! mutated before the store acknowledges; guard and validation failures
//! never reach the store.

use std::collections::HashMap;

use chrono::Utc;

use crate::consultation::{
    Action, Capabilities, ConsultationDraft, ConsultationRecord, Feasibility, FieldPatch,
    FollowUpDraft, QuotationNumberer, ValidationError, capabilities,
};
use crate::error::LabflowError;
use crate::reconcile::ConsultationSet;
use crate::store::{ConsultationApi, ConsultationQuery, QuotationRef, QuotationService};

pub struct ConsultationEngine<S> {
    store: S,
    set: ConsultationSet,
    numberer: QuotationNumberer,
    /// Quotations created but not yet linked, keyed by consultation id.
    /// A retry after a failed link reuses the entry instead of minting
    /// a duplicate quotation entity.
    pending_quotations: HashMap<i64, QuotationRef>,
}

impl<S: ConsultationApi + QuotationService> ConsultationEngine<S> {
    pub fn new(store: S, quotation_prefix: &str) -> Self {
        Self {
            store,
            set: ConsultationSet::new(),
            numberer: QuotationNumberer::new(quotation_prefix),
            pending_quotations: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a page from the store and replace the local collection.
    pub async fn refresh(&mut self, query: ConsultationQuery) -> Result<usize, LabflowError> {
        let page = self.store.page(&query).await?;
        self.set.set_filter(query);
        self.set.replace_all(page.records);
        Ok(self.set.len())
    }

    /// The current filtered view, re-derived from the full collection.
    pub fn view(&self) -> Vec<&ConsultationRecord> {
        self.set.view()
    }

    pub fn get(&self, id: i64) -> Option<&ConsultationRecord> {
        self.set.get(id)
    }

    /// Capability set for a locally held record.
    pub fn capabilities_for(&self, id: i64) -> Option<Capabilities> {
        self.set
            .get(id)
            .map(|r| capabilities(r.status, r.quotation_no.is_some()))
    }

    /// Look up the record and check the gate for one action. The single
    /// entry point to permissions for every operation below.
    fn require(&self, id: i64, action: Action) -> Result<&ConsultationRecord, LabflowError> {
        let record = self.set.get(id).ok_or(LabflowError::NotFound(id))?;
        capabilities(record.status, record.quotation_no.is_some())
            .require(action, record.status)?;
        Ok(record)
    }

    /// Re-fetch one record and merge the acknowledged value.
    async fn reconcile(&mut self, id: i64) -> Result<(), LabflowError> {
        let fresh = self.store.get(id).await?;
        self.set.apply(fresh);
        Ok(())
    }

    /// Fetch one record from the store into the local collection.
    pub async fn fetch(&mut self, id: i64) -> Result<(), LabflowError> {
        self.reconcile(id).await
    }

    /// Create a new consultation. The store assigns id and number.
    pub async fn create(&mut self, draft: ConsultationDraft) -> Result<i64, LabflowError> {
        draft.validate()?;
        let created = self.store.create(&draft).await?;
        let id = created.id;
        self.set.apply(created);
        Ok(id)
    }

    /// Update descriptive fields (and, explicitly, pending → following).
    pub async fn update_fields(&mut self, id: i64, patch: FieldPatch) -> Result<(), LabflowError> {
        if patch.is_empty() {
            return Err(ValidationError {
                field: "patch",
                message: "no fields to update".into(),
            }
            .into());
        }
        patch.validate()?;
        let record = self.require(id, Action::Edit)?;
        let mut updated = record.clone();
        updated.apply_fields(&patch)?;
        self.store.update(&updated).await?;
        self.reconcile(id).await
    }

    /// Append one follow-up entry to the record's ledger.
    pub async fn add_follow_up(
        &mut self,
        id: i64,
        draft: FollowUpDraft,
    ) -> Result<(), LabflowError> {
        draft.validate()?;
        self.require(id, Action::AddFollowUp)?;
        self.store.add_follow_up(id, &draft).await?;
        self.reconcile(id).await
    }

    /// Replace the feasibility assessment. Last write wins.
    pub async fn set_feasibility(
        &mut self,
        id: i64,
        feasibility: Feasibility,
        note: Option<String>,
        estimated_price: Option<f64>,
    ) -> Result<(), LabflowError> {
        if let Some(price) = estimated_price
            && price < 0.0
        {
            return Err(ValidationError {
                field: "estimatedPrice",
                message: "must not be negative".into(),
            }
            .into());
        }
        self.require(id, Action::UpdateFeasibility)?;
        self.store
            .set_feasibility(id, feasibility, note.as_deref(), estimated_price)
            .await?;
        self.reconcile(id).await
    }

    /// Close the consultation. Terminal.
    pub async fn close(&mut self, id: i64) -> Result<(), LabflowError> {
        self.require(id, Action::Close)?;
        self.store.close(id).await?;
        self.reconcile(id).await
    }

    /// Convert the consultation into a quotation, atomically.
    ///
    /// Synthesizes the number, asks the quotation subsystem for the real
    /// entity, links it on the store, then reconciles. No provisional
    /// quotation id is ever committed: if any step fails, the local
    /// record is unchanged. When the quotation was created but the link
    /// failed, a retry reuses that quotation instead of creating a
    /// second one.
    pub async fn generate_quotation(&mut self, id: i64) -> Result<String, LabflowError> {
        self.require(id, Action::GenerateQuotation)?;
        let quotation = match self.pending_quotations.get(&id).cloned() {
            Some(existing) => existing,
            None => {
                let record = self.set.get(id).ok_or(LabflowError::NotFound(id))?;
                let number = self.numberer.next(Utc::now().date_naive());
                let quotation = self.store.create_quotation(record, &number).await?;
                self.pending_quotations.insert(id, quotation.clone());
                quotation
            }
        };
        self.store
            .link_quotation(id, quotation.id, &quotation.quotation_no)
            .await?;
        self.pending_quotations.remove(&id);
        self.reconcile(id).await?;
        Ok(quotation.quotation_no)
    }

    /// Physically delete the record. Legal only from `pending`.
    pub async fn delete(&mut self, id: i64) -> Result<(), LabflowError> {
        self.require(id, Action::Delete)?;
        self.store.delete(id).await?;
        self.set.remove(id);
        Ok(())
    }

    /// The quotation workflow rejected the linked quotation. The event
    /// originates outside this engine; all we do is re-observe the record.
    pub async fn note_quotation_rejected(&mut self, id: i64) -> Result<(), LabflowError> {
        self.reconcile(id).await
    }
}
