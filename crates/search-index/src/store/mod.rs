//! The narrow interface between the search-index layer and its backing store.
//!
//! Every component issues its requests through a shared [`StoreClient`]. The
//! production implementation is [`ElasticsearchClient`]; tests substitute an
//! in-memory store.

mod client;
mod response;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

pub use client::ElasticsearchClient;
pub use response::{
    SearchHit, SearchHits, SearchResponse, TermsBucket, TotalHits, WriteResponse,
};

/// A shared, thread-safe store client.
pub type DynStoreClient = Arc<dyn StoreClient>;

/// Cluster health as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All shards allocated.
    Green,
    /// Primaries allocated, some replicas missing.
    Yellow,
    /// Some primaries unallocated.
    Red,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Green => write!(f, "green"),
            HealthStatus::Yellow => write!(f, "yellow"),
            HealthStatus::Red => write!(f, "red"),
        }
    }
}

/// Response of a cluster health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    /// The overall cluster status.
    pub status: HealthStatus,
    /// Whether the wait for the requested status timed out.
    #[serde(default)]
    pub timed_out: bool,
}

/// When a write becomes visible to searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshPolicy {
    /// Refresh the affected shards before the write returns.
    Immediate,
    /// Leave visibility to the store's refresh interval.
    Default,
}

/// One document of a bulk index request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItem {
    /// Target sub-index.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Document source.
    pub source: Value,
}

/// A bulk item the store refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemFailure {
    /// Target sub-index.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Per-item status.
    pub status: u16,
    /// Structured store error type, if reported.
    pub error_type: Option<String>,
    /// Failure reason.
    pub reason: String,
}

/// Outcome of a bulk request that reached the store.
///
/// Items are applied independently; `failures` lists the ones that were not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    /// Time the store spent on the request, in milliseconds.
    pub took_ms: u64,
    /// Number of items sent.
    pub items: usize,
    /// Items the store refused.
    pub failures: Vec<BulkItemFailure>,
}

impl BulkOutcome {
    /// Returns `true` if every item was applied.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Operations the search-index layer needs from its backing store.
///
/// Implementations must be safe for concurrent use; the layer adds no locking.
#[async_trait]
pub trait StoreClient: Send + Sync + Debug {
    /// Probes cluster health, waiting (bounded by the store) for `wait_for`.
    async fn cluster_health(&self, wait_for: HealthStatus) -> StoreResult<ClusterHealth>;

    /// Creates an index with the given settings/mappings body.
    ///
    /// Returns whether the store acknowledged the creation.
    async fn create_index(&self, index: &str, body: Value) -> StoreResult<bool>;

    /// Deletes an index. A missing index is reported as a 404 status error.
    async fn delete_index(&self, index: &str) -> StoreResult<bool>;

    /// Fetches a document's source, or `None` if it does not exist.
    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Indexes (creates or overwrites) a document.
    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        refresh: RefreshPolicy,
    ) -> StoreResult<WriteResponse>;

    /// Indexes a batch of documents in one request.
    async fn bulk_index(&self, items: &[BulkItem], refresh: RefreshPolicy)
    -> StoreResult<BulkOutcome>;

    /// Deletes a document. Returns `false` if it did not exist.
    async fn delete_document(&self, index: &str, id: &str, refresh: RefreshPolicy)
    -> StoreResult<bool>;

    /// Runs a search request body against the given indices.
    async fn search(&self, indices: &[String], body: &Value) -> StoreResult<SearchResponse>;
}
