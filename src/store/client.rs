//! HTTP client for the consultation REST backend.
//!
//! Implements [`ConsultationApi`] and [`QuotationService`] over reqwest.
//! Responses are `{code, message, data}` envelopes; see
//! [`types`](super::types) for the code conventions.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::error::StoreError;
use super::types::{
    ApiEnvelope, CODE_CONFLICT, CODE_OK, ConsultationQuery, CreateQuotationRequest, Page,
    QuotationRef,
};
use super::{ConsultationApi, QuotationService};
use crate::consultation::{ConsultationDraft, ConsultationRecord, Feasibility, FollowUpDraft};

pub struct ConsultationStore {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl ConsultationStore {
    /// Create a client pointing at the given API root (no trailing slash).
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            api_token,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Unwrap an envelope response, mapping non-success HTTP statuses and
    /// envelope codes to [`StoreError`].
    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Option<T>, StoreError> {
        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Err(StoreError::Conflict);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(StoreError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = response.json::<ApiEnvelope<T>>().await?;
        match envelope.code {
            CODE_OK => Ok(envelope.data),
            CODE_CONFLICT => Err(StoreError::Conflict),
            code => Err(StoreError::Api {
                code,
                message: envelope.message,
            }),
        }
    }

    async fn expect_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        Self::unwrap_envelope(response)
            .await?
            .ok_or(StoreError::MissingData)
    }

    async fn expect_void(response: reqwest::Response) -> Result<(), StoreError> {
        Self::unwrap_envelope::<serde_json::Value>(response)
            .await
            .map(|_| ())
    }
}

impl ConsultationApi for ConsultationStore {
    async fn page(
        &self,
        query: &ConsultationQuery,
    ) -> Result<Page<ConsultationRecord>, StoreError> {
        let response = self
            .request(Method::GET, "/consultation/page")
            .query(&query.to_pairs())
            .send()
            .await?;
        Self::expect_data(response).await
    }

    async fn get(&self, id: i64) -> Result<ConsultationRecord, StoreError> {
        let response = self
            .request(Method::GET, &format!("/consultation/{id}"))
            .send()
            .await?;
        Self::expect_data(response).await
    }

    async fn create(&self, draft: &ConsultationDraft) -> Result<ConsultationRecord, StoreError> {
        let response = self
            .request(Method::POST, "/consultation")
            .json(draft)
            .send()
            .await?;
        Self::expect_data(response).await
    }

    async fn update(&self, record: &ConsultationRecord) -> Result<(), StoreError> {
        let response = self
            .request(Method::PUT, "/consultation")
            .json(record)
            .send()
            .await?;
        Self::expect_void(response).await
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("/consultation/{id}"))
            .send()
            .await?;
        Self::expect_void(response).await
    }

    async fn close(&self, id: i64) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, &format!("/consultation/{id}/close"))
            .send()
            .await?;
        Self::expect_void(response).await
    }

    async fn add_follow_up(&self, id: i64, draft: &FollowUpDraft) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, &format!("/consultation/{id}/follow-up"))
            .json(draft)
            .send()
            .await?;
        Self::expect_void(response).await
    }

    async fn set_feasibility(
        &self,
        id: i64,
        feasibility: Feasibility,
        note: Option<&str>,
        estimated_price: Option<f64>,
    ) -> Result<(), StoreError> {
        let mut pairs = vec![("feasibility", feasibility.to_string())];
        if let Some(note) = note {
            pairs.push(("feasibilityNote", note.to_string()));
        }
        if let Some(price) = estimated_price {
            pairs.push(("estimatedPrice", price.to_string()));
        }
        let response = self
            .request(Method::POST, &format!("/consultation/{id}/feasibility"))
            .query(&pairs)
            .send()
            .await?;
        Self::expect_void(response).await
    }

    async fn link_quotation(
        &self,
        id: i64,
        quotation_id: i64,
        quotation_no: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::POST, &format!("/consultation/{id}/link-quotation"))
            .query(&[
                ("quotationId", quotation_id.to_string()),
                ("quotationNo", quotation_no.to_string()),
            ])
            .send()
            .await?;
        Self::expect_void(response).await
    }
}

impl QuotationService for ConsultationStore {
    async fn create_quotation(
        &self,
        record: &ConsultationRecord,
        quotation_no: &str,
    ) -> Result<QuotationRef, StoreError> {
        let body = CreateQuotationRequest {
            consultation_id: record.id,
            quotation_no: quotation_no.to_string(),
            company: record.company.clone(),
            contact: record.contact.clone(),
            estimated_price: record.estimated_price,
        };
        let response = self
            .request(Method::POST, "/quotation")
            .json(&body)
            .send()
            .await?;
        Self::expect_data(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consultation::{FollowUpKind, Status, sample_record};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record_json() -> serde_json::Value {
        serde_json::to_value(sample_record(Status::Following)).unwrap()
    }

    fn ok_envelope(data: serde_json::Value) -> serde_json::Value {
        json!({"code": 0, "message": "ok", "data": data})
    }

    #[tokio::test]
    async fn page_sends_filters_and_decodes_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultation/page"))
            .and(query_param("current", "2"))
            .and(query_param("size", "10"))
            .and(query_param("status", "following"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
                "records": [record_json()],
                "total": 1,
                "current": 2,
                "size": 10
            }))))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let query = ConsultationQuery {
            current: 2,
            size: 10,
            status: Some(Status::Following),
            keyword: None,
        };
        let page = store.page(&query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].company, "Acme Materials");
    }

    #[tokio::test]
    async fn get_decodes_a_single_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultation/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(record_json())))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let record = store.get(1).await.unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.status, Status::Following);
    }

    #[tokio::test]
    async fn bearer_token_is_sent_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultation/1"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(record_json())))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), Some("sk-test".into()));
        assert!(store.get(1).await.is_ok());
    }

    #[tokio::test]
    async fn non_zero_envelope_code_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consultation/1/close"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 403,
                "message": "status does not permit close"
            })))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let err = store.close(1).await.unwrap_err();
        match err {
            StoreError::Api { code, message } => {
                assert_eq!(code, 403);
                assert_eq!(message, "status does not permit close");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conflict_code_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/consultation"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 409,
                "message": "stale version"
            })))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let record = sample_record(Status::Following);
        assert!(matches!(
            store.update(&record).await.unwrap_err(),
            StoreError::Conflict
        ));
    }

    #[tokio::test]
    async fn http_conflict_status_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/consultation"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let record = sample_record(Status::Following);
        assert!(matches!(
            store.update(&record).await.unwrap_err(),
            StoreError::Conflict
        ));
    }

    #[tokio::test]
    async fn http_failure_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultation/7"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        match store.get(7).await.unwrap_err() {
            StoreError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_payload_is_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/consultation/1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok"})),
            )
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        assert!(matches!(
            store.get(1).await.unwrap_err(),
            StoreError::MissingData
        ));
    }

    #[tokio::test]
    async fn add_follow_up_posts_the_draft_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consultation/1/follow-up"))
            .and(body_partial_json(json!({
                "type": "phone",
                "content": "called to confirm",
                "operator": "li.na"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok"})),
            )
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let draft = FollowUpDraft {
            kind: FollowUpKind::Phone,
            content: "called to confirm".into(),
            next_action: None,
            operator: "li.na".into(),
        };
        store.add_follow_up(1, &draft).await.unwrap();
    }

    #[tokio::test]
    async fn feasibility_sends_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consultation/1/feasibility"))
            .and(query_param("feasibility", "difficult"))
            .and(query_param("feasibilityNote", "needs subcontract"))
            .and(query_param("estimatedPrice", "8000"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok"})),
            )
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        store
            .set_feasibility(
                1,
                crate::consultation::Feasibility::Difficult,
                Some("needs subcontract"),
                Some(8000.0),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn link_quotation_sends_both_identifiers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/consultation/1/link-quotation"))
            .and(query_param("quotationId", "42"))
            .and(query_param("quotationNo", "BJ20231201001"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok"})),
            )
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        store.link_quotation(1, 42, "BJ20231201001").await.unwrap();
    }

    #[tokio::test]
    async fn create_quotation_returns_the_real_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/quotation"))
            .and(body_partial_json(json!({
                "consultationId": 1,
                "quotationNo": "BJ20231201001",
                "company": "Acme Materials"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_envelope(json!({
                "id": 42,
                "quotationNo": "BJ20231201001"
            }))))
            .mount(&server)
            .await;

        let store = ConsultationStore::new(server.uri(), None);
        let record = sample_record(Status::Following);
        let quotation = store
            .create_quotation(&record, "BJ20231201001")
            .await
            .unwrap();
        assert_eq!(quotation.id, 42);
        assert_eq!(quotation.quotation_no, "BJ20231201001");
    }
}
