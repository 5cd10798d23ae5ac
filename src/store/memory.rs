//! In-memory consultation store.
//!
//! Implements the same [`ConsultationApi`] / [`QuotationService`] surface
//! as the HTTP client, enforcing the lifecycle guards on its own side —
//! the server never trusts the caller's gate check. Backs the offline
//! `demo` command and the engine tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use super::error::StoreError;
use super::types::{CODE_FORBIDDEN, ConsultationQuery, Page, QuotationRef};
use super::{ConsultationApi, QuotationService};
use crate::consultation::{
    ConsultationDraft, ConsultationRecord, Feasibility, FollowUpDraft, GuardViolation, Status,
    ValidationError,
};

fn guard_rejection(violation: GuardViolation) -> StoreError {
    StoreError::Api {
        code: CODE_FORBIDDEN,
        message: violation.to_string(),
    }
}

fn invalid(error: ValidationError) -> StoreError {
    StoreError::Api {
        code: 400,
        message: error.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<i64, ConsultationRecord>>,
    next_id: AtomicI64,
    next_quotation_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            next_quotation_id: AtomicI64::new(1),
        }
    }

    /// Simulate the external quotation workflow rejecting a quotation.
    /// The consultation moves to `rejected`; the link is preserved.
    pub fn reject_quotation(&self, id: i64) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get_mut(&id).ok_or_else(|| not_found(id))?;
        record.quotation_rejected().map_err(guard_rejection)
    }
}

fn not_found(id: i64) -> StoreError {
    StoreError::Api {
        code: 404,
        message: format!("consultation {id} not found"),
    }
}

impl ConsultationApi for MemoryStore {
    async fn page(
        &self,
        query: &ConsultationQuery,
    ) -> Result<Page<ConsultationRecord>, StoreError> {
        let map = self.records.lock().expect("store lock poisoned");
        let mut matched: Vec<ConsultationRecord> =
            map.values().filter(|r| query.matches(r)).cloned().collect();
        matched.sort_by(|a, b| b.create_time.cmp(&a.create_time));

        let total = matched.len() as u64;
        // Offset in u64 so an absurd page number cannot overflow.
        let start = (u64::from(query.current.max(1)) - 1) * u64::from(query.size);
        let records = matched
            .into_iter()
            .skip(usize::try_from(start).unwrap_or(usize::MAX))
            .take(query.size as usize)
            .collect();

        Ok(Page {
            records,
            total,
            current: query.current,
            size: query.size,
        })
    }

    async fn get(&self, id: i64) -> Result<ConsultationRecord, StoreError> {
        let map = self.records.lock().expect("store lock poisoned");
        map.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    async fn create(&self, draft: &ConsultationDraft) -> Result<ConsultationRecord, StoreError> {
        draft.validate().map_err(invalid)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        // A record with a follower starts directly in `following`.
        let status = if draft.follower.is_some() {
            Status::Following
        } else {
            Status::Pending
        };
        let record = ConsultationRecord {
            id,
            consultation_no: format!("CS{}{id:03}", now.format("%Y%m%d")),
            status,
            company: draft.company.clone(),
            contact: draft.contact.clone(),
            phone: draft.phone.clone(),
            sample_description: draft.sample_description.clone(),
            test_items: draft.test_items.clone(),
            urgency: draft.urgency.clone(),
            deadline: draft.deadline,
            budget: draft.budget,
            follower: draft.follower.clone(),
            follow_up_records: Vec::new(),
            feasibility: None,
            feasibility_note: None,
            estimated_price: None,
            quotation_id: None,
            quotation_no: None,
            attachments: Vec::new(),
            created_by: draft.created_by.clone(),
            create_time: now,
            updated_at: now,
            version: 0,
        };
        let mut map = self.records.lock().expect("store lock poisoned");
        map.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, record: &ConsultationRecord) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let stored = map.get(&record.id).ok_or_else(|| not_found(record.id))?;
        // The incoming record must be derived from the currently stored
        // version; anything else means another caller got there first.
        if record.version != stored.version + 1 {
            return Err(StoreError::Conflict);
        }
        if !stored.status.is_mutable() {
            return Err(StoreError::Api {
                code: CODE_FORBIDDEN,
                message: format!("status '{}' does not permit updates", stored.status),
            });
        }
        map.insert(record.id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get(&id).ok_or_else(|| not_found(id))?;
        if !record.deletable() {
            return Err(StoreError::Api {
                code: CODE_FORBIDDEN,
                message: format!("status '{}' does not permit deletion", record.status),
            });
        }
        map.remove(&id);
        Ok(())
    }

    async fn close(&self, id: i64) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get_mut(&id).ok_or_else(|| not_found(id))?;
        record.close().map_err(guard_rejection)
    }

    async fn add_follow_up(&self, id: i64, draft: &FollowUpDraft) -> Result<(), StoreError> {
        draft.validate().map_err(invalid)?;
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get_mut(&id).ok_or_else(|| not_found(id))?;
        let entry = draft.clone().into_record(Utc::now());
        record.append_follow_up(entry).map_err(guard_rejection)
    }

    async fn set_feasibility(
        &self,
        id: i64,
        feasibility: Feasibility,
        note: Option<&str>,
        estimated_price: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get_mut(&id).ok_or_else(|| not_found(id))?;
        record
            .set_feasibility(feasibility, note.map(str::to_string), estimated_price)
            .map_err(guard_rejection)
    }

    async fn link_quotation(
        &self,
        id: i64,
        quotation_id: i64,
        quotation_no: &str,
    ) -> Result<(), StoreError> {
        let mut map = self.records.lock().expect("store lock poisoned");
        let record = map.get_mut(&id).ok_or_else(|| not_found(id))?;
        record
            .link_quotation(quotation_id, quotation_no)
            .map_err(guard_rejection)
    }
}

impl QuotationService for MemoryStore {
    async fn create_quotation(
        &self,
        _record: &ConsultationRecord,
        quotation_no: &str,
    ) -> Result<QuotationRef, StoreError> {
        let id = self.next_quotation_id.fetch_add(1, Ordering::Relaxed);
        Ok(QuotationRef {
            id,
            quotation_no: quotation_no.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(company: &str, follower: Option<&str>) -> ConsultationDraft {
        ConsultationDraft {
            company: company.into(),
            contact: "Wei Chen".into(),
            phone: None,
            sample_description: None,
            test_items: None,
            urgency: None,
            deadline: None,
            budget: None,
            follower: follower.map(str::to_string),
            created_by: "admin".into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_number_and_status() {
        let store = MemoryStore::new();
        let pending = store.create(&draft("Acme", None)).await.unwrap();
        assert_eq!(pending.status, Status::Pending);
        assert!(pending.consultation_no.starts_with("CS"));

        let following = store.create(&draft("Globex", Some("li.na"))).await.unwrap();
        assert_eq!(following.status, Status::Following);
        assert_ne!(pending.id, following.id);
    }

    #[tokio::test]
    async fn guards_are_enforced_server_side() {
        let store = MemoryStore::new();
        let record = store.create(&draft("Acme", None)).await.unwrap();
        store.close(record.id).await.unwrap();

        // A second close must fail even though the caller skipped the gate.
        let err = store.close(record.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { code: 403, .. }));
    }

    #[tokio::test]
    async fn delete_only_from_pending() {
        let store = MemoryStore::new();
        let pending = store.create(&draft("Acme", None)).await.unwrap();
        let following = store.create(&draft("Globex", Some("li.na"))).await.unwrap();

        store.delete(pending.id).await.unwrap();
        assert!(store.get(pending.id).await.is_err());

        let err = store.delete(following.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { code: 403, .. }));
        assert!(store.get(following.id).await.is_ok());
    }

    #[tokio::test]
    async fn stale_version_update_conflicts() {
        let store = MemoryStore::new();
        let created = store.create(&draft("Acme", Some("li.na"))).await.unwrap();

        // First caller updates from the stored version.
        let mut first = created.clone();
        first
            .apply_fields(&crate::consultation::FieldPatch {
                contact: Some("Mei Lin".into()),
                ..Default::default()
            })
            .unwrap();
        store.update(&first).await.unwrap();

        // Second caller still holds the original snapshot.
        let mut second = created.clone();
        second
            .apply_fields(&crate::consultation::FieldPatch {
                contact: Some("Jo Park".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(matches!(
            store.update(&second).await.unwrap_err(),
            StoreError::Conflict
        ));

        // The first write survives.
        let current = store.get(created.id).await.unwrap();
        assert_eq!(current.contact, "Mei Lin");
    }

    #[tokio::test]
    async fn page_filters_and_paginates() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.create(&draft(&format!("Company {i}"), None)).await.unwrap();
        }
        store.create(&draft("Acme", Some("li.na"))).await.unwrap();

        let all = store.page(&ConsultationQuery::default()).await.unwrap();
        assert_eq!(all.total, 6);

        let following_only = store
            .page(&ConsultationQuery {
                status: Some(Status::Following),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(following_only.total, 1);
        assert_eq!(following_only.records[0].company, "Acme");

        let small_page = store
            .page(&ConsultationQuery {
                current: 2,
                size: 4,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(small_page.total, 6);
        assert_eq!(small_page.records.len(), 2);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        store.create(&draft("Acme", None)).await.unwrap();

        let page = store
            .page(&ConsultationQuery {
                current: u32::MAX,
                size: u32::MAX,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.records.is_empty());
    }

    #[tokio::test]
    async fn follow_up_appends_in_order() {
        let store = MemoryStore::new();
        let record = store.create(&draft("Acme", Some("li.na"))).await.unwrap();
        for content in ["first call", "second call"] {
            store
                .add_follow_up(
                    record.id,
                    &FollowUpDraft {
                        kind: crate::consultation::FollowUpKind::Phone,
                        content: content.into(),
                        next_action: None,
                        operator: "li.na".into(),
                    },
                )
                .await
                .unwrap();
        }
        let current = store.get(record.id).await.unwrap();
        assert_eq!(current.follow_up_records.len(), 2);
        assert_eq!(current.follow_up_records[0].content, "first call");
        assert_eq!(current.follow_up_records[1].content, "second call");
    }

    #[tokio::test]
    async fn reject_quotation_requires_quoted() {
        let store = MemoryStore::new();
        let record = store.create(&draft("Acme", Some("li.na"))).await.unwrap();
        assert!(store.reject_quotation(record.id).is_err());

        store
            .link_quotation(record.id, 42, "BJ20231201001")
            .await
            .unwrap();
        store.reject_quotation(record.id).unwrap();

        let current = store.get(record.id).await.unwrap();
        assert_eq!(current.status, Status::Rejected);
        assert_eq!(current.quotation_no.as_deref(), Some("BJ20231201001"));
    }
}
