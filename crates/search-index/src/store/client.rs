//! [`StoreClient`] implementation backed by the `elasticsearch` crate.

use std::fmt::Debug;
use std::io::ErrorKind as IoErrorKind;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesDeleteParts};
use elasticsearch::params::{Refresh, SearchType, WaitForStatus};
use elasticsearch::{BulkParts, DeleteParts, Elasticsearch, GetParts, IndexParts, SearchParts};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::SearchIndexConfig;
use crate::error::{ConfigError, StoreError, StoreResult};

use super::{
    BulkItem, BulkItemFailure, BulkOutcome, ClusterHealth, HealthStatus, RefreshPolicy,
    SearchResponse, StoreClient, WriteResponse,
};

/// How long the store may hold a health probe while waiting for the requested status.
const HEALTH_WAIT_TIMEOUT: &str = "30s";

/// Elasticsearch-backed store client.
///
/// Wraps a single long-lived [`Elasticsearch`] client; the underlying HTTP
/// transport is safe for concurrent use.
pub struct ElasticsearchClient {
    client: Elasticsearch,
    url: String,
}

impl Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchClient {
    /// Builds a client from configuration. No request is sent.
    pub fn new(config: &SearchIndexConfig) -> Result<Self, ConfigError> {
        let url = config.url();

        let parsed_url = url
            .parse::<elasticsearch::http::Url>()
            .map_err(|e| ConfigError::InvalidUrl {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool).timeout(config.request_timeout());

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some((username, password)) = config.credentials() {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }

        let transport = builder.build().map_err(|e| ConfigError::InvalidUrl {
            url: url.clone(),
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Self {
            client: Elasticsearch::new(transport),
            url,
        })
    }

    /// Returns the store URL this client talks to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Classifies a transport-level failure.
///
/// Refused, reset, or prematurely closed connections mean the store is not
/// (yet) reachable; timeouts are treated the same way. A request that fails
/// while being sent, before any status arrives, counts as a closed connection.
fn classify(err: elasticsearch::Error) -> StoreError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(http) = current.downcast_ref::<reqwest::Error>() {
            if http.status().is_none() && (http.is_connect() || http.is_request()) {
                return StoreError::Unreachable {
                    message: err.to_string(),
                };
            }
        }
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                IoErrorKind::ConnectionRefused
                    | IoErrorKind::ConnectionReset
                    | IoErrorKind::ConnectionAborted
                    | IoErrorKind::NotConnected
                    | IoErrorKind::BrokenPipe
                    | IoErrorKind::UnexpectedEof
            ) {
                return StoreError::Unreachable {
                    message: err.to_string(),
                };
            }
        }
        source = current.source();
    }

    if err.is_timeout() {
        return StoreError::Unreachable {
            message: err.to_string(),
        };
    }

    if let Some(status) = err.status_code() {
        return StoreError::Status {
            status: status.as_u16(),
            error_type: None,
            reason: err.to_string(),
        };
    }

    StoreError::Transport {
        message: err.to_string(),
    }
}

/// Turns a non-success response into a structured status error.
async fn check(response: Response) -> StoreResult<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::from_response(status.as_u16(), &body))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
    response.json::<T>().await.map_err(|e| StoreError::Decode {
        message: e.to_string(),
    })
}

/// Interprets a 404 from a document endpoint.
///
/// A missing document carries no error object; a missing index does.
fn missing_document(status: u16, body: &str) -> StoreResult<()> {
    let err = StoreError::from_response(status, body);
    match err.error_type() {
        None => Ok(()),
        Some(_) => Err(err),
    }
}

fn refresh_param(refresh: RefreshPolicy) -> Refresh {
    match refresh {
        RefreshPolicy::Immediate => Refresh::True,
        RefreshPolicy::Default => Refresh::False,
    }
}

#[derive(Deserialize)]
struct Acknowledged {
    #[serde(default)]
    acknowledged: bool,
}

#[derive(Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

#[derive(Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    took: u64,
    #[serde(default)]
    items: Vec<serde_json::Map<String, Value>>,
}

/// Collects the failed items of a bulk response.
fn bulk_failures(items: &[serde_json::Map<String, Value>]) -> Vec<BulkItemFailure> {
    items
        .iter()
        .filter_map(|item| item.values().next())
        .filter_map(|result| {
            let error = result.get("error")?;
            Some(BulkItemFailure {
                index: result
                    .get("_index")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                id: result
                    .get("_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                status: result
                    .get("status")
                    .and_then(|v| v.as_u64())
                    .and_then(|s| u16::try_from(s).ok())
                    .unwrap_or(0),
                error_type: error.get("type").and_then(|t| t.as_str()).map(String::from),
                reason: error
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl StoreClient for ElasticsearchClient {
    async fn cluster_health(&self, wait_for: HealthStatus) -> StoreResult<ClusterHealth> {
        let wait_for = match wait_for {
            HealthStatus::Green => WaitForStatus::Green,
            HealthStatus::Yellow => WaitForStatus::Yellow,
            HealthStatus::Red => WaitForStatus::Red,
        };

        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .wait_for_status(wait_for)
            .timeout(HEALTH_WAIT_TIMEOUT)
            .send()
            .await
            .map_err(classify)?;

        // 408 means the wait timed out; the body still carries the current status
        if response.status_code().as_u16() == 408 {
            return read_json(response).await;
        }

        read_json(check(response).await?).await
    }

    async fn create_index(&self, index: &str, body: Value) -> StoreResult<bool> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let ack: Acknowledged = read_json(check(response).await?).await?;
        Ok(ack.acknowledged)
    }

    async fn delete_index(&self, index: &str) -> StoreResult<bool> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(classify)?;

        let ack: Acknowledged = read_json(check(response).await?).await?;
        Ok(ack.acknowledged)
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status_code().as_u16();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return missing_document(status, &body).map(|_| None);
        }

        let body: GetResponse = read_json(check(response).await?).await?;
        Ok(if body.found { body.source } else { None })
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        refresh: RefreshPolicy,
    ) -> StoreResult<WriteResponse> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .refresh(refresh_param(refresh))
            .body(source)
            .send()
            .await
            .map_err(classify)?;

        read_json(check(response).await?).await
    }

    async fn bulk_index(
        &self,
        items: &[BulkItem],
        refresh: RefreshPolicy,
    ) -> StoreResult<BulkOutcome> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(items.len() * 2);
        for item in items {
            body.push(json!({ "index": { "_index": item.index, "_id": item.id } }).into());
            body.push(item.source.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .refresh(refresh_param(refresh))
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        let raw: RawBulkResponse = read_json(check(response).await?).await?;
        Ok(BulkOutcome {
            took_ms: raw.took,
            items: items.len(),
            failures: bulk_failures(&raw.items),
        })
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: RefreshPolicy,
    ) -> StoreResult<bool> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .refresh(refresh_param(refresh))
            .send()
            .await
            .map_err(classify)?;

        let status = response.status_code().as_u16();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return missing_document(status, &body).map(|_| false);
        }

        check(response).await?;
        Ok(true)
    }

    async fn search(&self, indices: &[String], body: &Value) -> StoreResult<SearchResponse> {
        let indices: Vec<&str> = indices.iter().map(String::as_str).collect();

        let response = self
            .client
            .search(SearchParts::Index(&indices))
            .search_type(SearchType::QueryThenFetch)
            .preference("_local")
            .body(body)
            .send()
            .await
            .map_err(classify)?;

        read_json(check(response).await?).await
    }
}
