//! Wire types for the consultation REST backend.
//!
//! Every response arrives wrapped in an [`ApiEnvelope`]; `code == 0`
//! means success and `data` carries the payload. Structs serialize in
//! camelCase to match the backend's JSON.

use serde::{Deserialize, Serialize};

use crate::consultation::{ConsultationRecord, Status};

/// Envelope code meaning success.
pub const CODE_OK: i32 = 0;
/// Envelope code meaning the caller's version token is stale.
pub const CODE_CONFLICT: i32 = 409;
/// Envelope code meaning the server-side guard rejected the operation.
pub const CODE_FORBIDDEN: i32 = 403;

/// Generic `{code, message, data}` response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// One page of records from `GET /consultation/page`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: u64,
    pub current: u32,
    pub size: u32,
}

/// Filters and paging for the list endpoint.
#[derive(Debug, Clone)]
pub struct ConsultationQuery {
    pub current: u32,
    pub size: u32,
    pub status: Option<Status>,
    pub keyword: Option<String>,
}

impl Default for ConsultationQuery {
    fn default() -> Self {
        Self {
            current: 1,
            size: 20,
            status: None,
            keyword: None,
        }
    }
}

impl ConsultationQuery {
    /// Render the query-string pairs in the order the backend expects.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("current", self.current.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        pairs
    }

    /// Whether a record passes this query's filters (used to re-derive
    /// local views with the same semantics as the backend).
    pub fn matches(&self, record: &ConsultationRecord) -> bool {
        if let Some(status) = self.status
            && record.status != status
        {
            return false;
        }
        if let Some(keyword) = &self.keyword {
            let needle = keyword.to_lowercase();
            let hit = record.company.to_lowercase().contains(&needle)
                || record.contact.to_lowercase().contains(&needle)
                || record.consultation_no.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

/// The quotation entity created by the external quotation subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRef {
    pub id: i64,
    pub quotation_no: String,
}

/// Request body for `POST /quotation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuotationRequest {
    pub consultation_id: i64,
    pub quotation_no: String,
    pub company: String,
    pub contact: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::sample_record;

    #[test]
    fn envelope_deserializes_with_missing_data() {
        let env: ApiEnvelope<ConsultationRecord> =
            serde_json::from_str(r#"{"code": 0, "message": "ok"}"#).unwrap();
        assert_eq!(env.code, CODE_OK);
        assert!(env.data.is_none());
    }

    #[test]
    fn envelope_carries_payload() {
        let json = r#"{"code":0,"message":"","data":{"records":[],"total":0,"current":1,"size":20}}"#;
        let env: ApiEnvelope<Page<ConsultationRecord>> = serde_json::from_str(json).unwrap();
        let page = env.data.unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.current, 1);
    }

    #[test]
    fn query_pairs_include_only_set_filters() {
        let query = ConsultationQuery::default();
        let pairs = query.to_pairs();
        assert_eq!(pairs.len(), 2);

        let query = ConsultationQuery {
            status: Some(Status::Following),
            keyword: Some("acme".into()),
            ..Default::default()
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("status", "following".to_string())));
        assert!(pairs.contains(&("keyword", "acme".to_string())));
    }

    #[test]
    fn query_matches_status_and_keyword() {
        let record = sample_record(Status::Following);

        let by_status = ConsultationQuery {
            status: Some(Status::Pending),
            ..Default::default()
        };
        assert!(!by_status.matches(&record));

        let by_keyword = ConsultationQuery {
            keyword: Some("ACME".into()),
            ..Default::default()
        };
        assert!(by_keyword.matches(&record));

        let miss = ConsultationQuery {
            keyword: Some("globex".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&record));
    }
}
