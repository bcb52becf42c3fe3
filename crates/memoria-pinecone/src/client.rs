// SPDX-FileCopyrightText: 2026 Memoria Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Pinecone control and data planes.

use std::time::Duration;

use memoria_core::MemoriaError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{
    ApiErrorResponse, DeleteRequest, FetchResponse, IndexDescription, QueryRequest, QueryResponse,
    UpdateRequest, UpsertRequest, UpsertResponse,
};

/// API version pinned for every request.
const API_VERSION: &str = "2024-07";

/// HTTP client bound to one Pinecone index.
///
/// Retries once after one second on 429, 500, 502 and 503.
#[derive(Debug, Clone)]
pub struct PineconeClient {
    client: reqwest::Client,
    host: String,
    max_retries: u32,
}

fn build_http_client(api_key: &str, timeout: Duration) -> Result<reqwest::Client, MemoriaError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Api-Key",
        HeaderValue::from_str(api_key).map_err(|e| {
            MemoriaError::Config(format!("invalid Pinecone API key header value: {e}"))
        })?,
    );
    headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));
    headers.insert("content-type", HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|e| {
            MemoriaError::storage("connect", None, format!("failed to build HTTP client: {e}"))
        })
}

/// Prefix a bare host with `https://` and drop any trailing slash.
pub(crate) fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// `GET {control_plane}/indexes/{name}`: resolves the data-plane host and dimension.
pub async fn describe_index(
    api_key: &str,
    control_plane_url: &str,
    index_name: &str,
    timeout: Duration,
) -> Result<IndexDescription, MemoriaError> {
    let client = build_http_client(api_key, timeout)?;
    let url = format!("{}/indexes/{index_name}", control_plane_url.trim_end_matches('/'));

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            storage_error("describe_index", None, format!("HTTP request failed: {e}"), e)
        })?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(MemoriaError::storage(
            "describe_index",
            None,
            api_error_message(status, &body),
        ));
    }
    serde_json::from_str(&body).map_err(|e| {
        storage_error("describe_index", None, format!("failed to parse index description: {e}"), e)
    })
}

impl PineconeClient {
    /// Creates a client for the data-plane `host` of one index.
    pub fn new(api_key: &str, host: &str, timeout: Duration) -> Result<Self, MemoriaError> {
        Ok(Self {
            client: build_http_client(api_key, timeout)?,
            host: normalize_host(host),
            max_retries: 1,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResponse, MemoriaError> {
        let record_id = request.vectors.first().map(|v| v.id.as_str());
        self.send("upsert", record_id, Method::POST, "/vectors/upsert", Some(request))
            .await
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, MemoriaError> {
        self.send("query", None, Method::POST, "/query", Some(request))
            .await
    }

    /// `GET /vectors/fetch?ids=...`.
    pub async fn fetch(&self, ids: &[String]) -> Result<FetchResponse, MemoriaError> {
        let url = Url::parse_with_params(
            &format!("{}/vectors/fetch", self.host),
            ids.iter().map(|id| ("ids", id.as_str())),
        )
        .map_err(|e| MemoriaError::storage("fetch", None, format!("invalid fetch URL: {e}")))?;
        let record_id = ids.first().map(String::as_str);
        self.send_url::<(), _>("fetch", record_id, Method::GET, url, None)
            .await
    }

    pub async fn update(&self, request: &UpdateRequest) -> Result<(), MemoriaError> {
        let _: serde_json::Value = self
            .send(
                "update",
                Some(request.id.as_str()),
                Method::POST,
                "/vectors/update",
                Some(request),
            )
            .await?;
        Ok(())
    }

    pub async fn delete(&self, request: &DeleteRequest) -> Result<(), MemoriaError> {
        let record_id = request
            .ids
            .as_ref()
            .and_then(|ids| ids.first())
            .map(String::as_str);
        let _: serde_json::Value = self
            .send("delete", record_id, Method::POST, "/vectors/delete", Some(request))
            .await?;
        Ok(())
    }

    async fn send<B, R>(
        &self,
        operation: &'static str,
        record_id: Option<&str>,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, MemoriaError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = Url::parse(&format!("{}{path}", self.host))
            .map_err(|e| MemoriaError::storage(operation, record_id, format!("invalid URL: {e}")))?;
        self.send_url(operation, record_id, method, url, body).await
    }

    async fn send_url<B, R>(
        &self,
        operation: &'static str,
        record_id: Option<&str>,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<R, MemoriaError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, operation, "retrying Pinecone request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut builder = self.client.request(method.clone(), url.clone());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let response = builder.send().await.map_err(|e| {
                storage_error(operation, record_id, format!("HTTP request failed: {e}"), e)
            })?;

            let status = response.status();
            debug!(status = %status, attempt, operation, "Pinecone response received");
            let text = response.text().await.unwrap_or_default();

            if status.is_success() {
                // update/delete answer with `{}` or an empty body
                let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
                return serde_json::from_str(text).map_err(|e| {
                    storage_error(operation, record_id, format!("failed to parse response: {e}"), e)
                });
            }

            let error =
                MemoriaError::storage(operation, record_id, api_error_message(status, &text));
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| {
            MemoriaError::storage(operation, record_id, "request failed after retries")
        }))
    }
}

fn storage_error(
    operation: &'static str,
    record_id: Option<&str>,
    message: String,
    source: impl std::error::Error + Send + Sync + 'static,
) -> MemoriaError {
    MemoriaError::Storage {
        operation,
        record_id: record_id.map(str::to_string),
        message,
        source: Some(Box::new(source)),
    }
}

fn api_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .as_ref()
        .and_then(ApiErrorResponse::message)
    {
        Some(message) => format!("Pinecone API error ({status}): {message}"),
        None => format!("API returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vector;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(uri: &str) -> PineconeClient {
        PineconeClient::new("pc-test-key", uri, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn bare_hosts_get_https() {
        assert_eq!(
            normalize_host("memories-abc.svc.pinecone.io"),
            "https://memories-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[tokio::test]
    async fn describe_index_reads_host_and_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/memories"))
            .and(header("Api-Key", "pc-test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "memories",
                "dimension": 1536,
                "metric": "cosine",
                "host": "memories-abc.svc.pinecone.io",
                "status": {"ready": true, "state": "Ready"}
            })))
            .mount(&server)
            .await;

        let desc = describe_index("pc-test-key", &server.uri(), "memories", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(desc.dimension, 1536);
        assert_eq!(desc.host, "memories-abc.svc.pinecone.io");
    }

    #[tokio::test]
    async fn describe_missing_index_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "NOT_FOUND", "message": "Resource nope not found"}
            })))
            .mount(&server)
            .await;

        let err = describe_index("k", &server.uri(), "nope", Duration::from_secs(5))
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("Resource nope not found"), "got: {err}");
    }

    #[tokio::test]
    async fn upsert_sends_vectors_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/upsert"))
            .and(header("Api-Key", "pc-test-key"))
            .and(header("X-Pinecone-API-Version", API_VERSION))
            .and(body_json(serde_json::json!({
                "vectors": [{"id": "r1", "values": [0.5, 0.5]}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"upsertedCount": 1})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let resp = client
            .upsert(&UpsertRequest {
                vectors: vec![Vector {
                    id: "r1".into(),
                    values: vec![0.5, 0.5],
                    metadata: None,
                }],
            })
            .await
            .unwrap();
        assert_eq!(resp.upserted_count, 1);
    }

    #[tokio::test]
    async fn fetch_passes_ids_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vectors/fetch"))
            .and(query_param("ids", "r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "vectors": {"r1": {"id": "r1", "values": [1.0], "metadata": {"user_id": "alice"}}},
                "namespace": ""
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let resp = client.fetch(&["r1".to_string()]).await.unwrap();
        assert_eq!(resp.vectors["r1"].values, vec![1.0]);
    }

    #[tokio::test]
    async fn empty_success_body_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/delete"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client
            .delete(&DeleteRequest {
                ids: Some(vec!["r1".into()]),
                filter: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn retries_once_on_503_then_reports_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/vectors/update"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .update(&UpdateRequest {
                id: "r9".into(),
                values: None,
                set_metadata: None,
            })
            .await
            .unwrap_err();
        match err {
            MemoriaError::Storage {
                operation,
                record_id,
                ..
            } => {
                assert_eq!(operation, "update");
                assert_eq!(record_id.as_deref(), Some("r9"));
            }
            other => panic!("expected Storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 3, "message": "Vector dimension 2 does not match the dimension of the index 1536"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .query(&QueryRequest {
                vector: vec![0.1, 0.2],
                top_k: 3,
                filter: None,
                include_metadata: true,
                include_values: false,
            })
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("does not match"), "got: {err}");
    }
}
