//! Reconciliation of store-acknowledged records into the local collection.
//!
//! [`ConsultationSet`] owns the full collection; filtered or sorted views
//! are always re-derived from it and never patched directly. Mutations
//! land here only after the store has acknowledged them — nothing in this
//! module is speculative.

use crate::consultation::ConsultationRecord;
use crate::store::ConsultationQuery;

/// The client-held collection of consultation records plus the filter
/// currently applied to the visible view.
#[derive(Default)]
pub struct ConsultationSet {
    records: Vec<ConsultationRecord>,
    filter: ConsultationQuery,
}

impl ConsultationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection after a page fetch.
    pub fn replace_all(&mut self, records: Vec<ConsultationRecord>) {
        self.records = records;
    }

    /// Merge one store-acknowledged record: replace the matching record
    /// by id, or insert it if it is new to the collection.
    pub fn apply(&mut self, record: ConsultationRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Drop a record after an acknowledged delete.
    pub fn remove(&mut self, id: i64) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    pub fn get(&self, id: i64) -> Option<&ConsultationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn set_filter(&mut self, filter: ConsultationQuery) {
        self.filter = filter;
    }

    /// The visible view: filtered by the current query and ordered by
    /// creation time, newest first. Re-derived from the full collection
    /// on every call.
    pub fn view(&self) -> Vec<&ConsultationRecord> {
        let mut visible: Vec<&ConsultationRecord> = self
            .records
            .iter()
            .filter(|r| self.filter.matches(r))
            .collect();
        visible.sort_by(|a, b| b.create_time.cmp(&a.create_time));
        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::{Status, sample_record};
    use chrono::Duration;

    fn record(id: i64, status: Status, minutes_ago: i64) -> ConsultationRecord {
        let mut r = sample_record(status);
        r.id = id;
        r.create_time -= Duration::minutes(minutes_ago);
        r
    }

    #[test]
    fn apply_replaces_by_id() {
        let mut set = ConsultationSet::new();
        set.replace_all(vec![record(1, Status::Pending, 10), record(2, Status::Following, 5)]);

        let mut updated = record(1, Status::Closed, 10);
        updated.company = "Globex".into();
        set.apply(updated);

        assert_eq!(set.len(), 2);
        let merged = set.get(1).unwrap();
        assert_eq!(merged.status, Status::Closed);
        assert_eq!(merged.company, "Globex");
    }

    #[test]
    fn apply_inserts_unknown_records() {
        let mut set = ConsultationSet::new();
        set.apply(record(7, Status::Pending, 0));
        assert_eq!(set.len(), 1);
        assert!(set.get(7).is_some());
    }

    #[test]
    fn remove_reports_whether_anything_was_dropped() {
        let mut set = ConsultationSet::new();
        set.replace_all(vec![record(1, Status::Pending, 0)]);
        assert!(set.remove(1));
        assert!(!set.remove(1));
        assert!(set.is_empty());
    }

    #[test]
    fn view_is_rederived_from_the_full_collection() {
        let mut set = ConsultationSet::new();
        set.replace_all(vec![
            record(1, Status::Pending, 30),
            record(2, Status::Following, 20),
            record(3, Status::Following, 10),
        ]);
        set.set_filter(ConsultationQuery {
            status: Some(Status::Following),
            ..Default::default()
        });

        let view = set.view();
        assert_eq!(view.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);

        // A reconciled change to a hidden record shows up once it matches
        // the filter — the view is never patched, only re-derived.
        let mut now_following = record(1, Status::Following, 30);
        now_following.version = 1;
        set.apply(now_following);
        let view = set.view();
        assert_eq!(view.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);
    }

    #[test]
    fn view_orders_newest_first() {
        let mut set = ConsultationSet::new();
        set.replace_all(vec![
            record(1, Status::Pending, 5),
            record(2, Status::Pending, 50),
            record(3, Status::Pending, 1),
        ]);
        let view = set.view();
        assert_eq!(view.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 1, 2]);
    }
}
