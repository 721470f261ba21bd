//! Document writes.
//!
//! Every write uses [`RefreshPolicy::Immediate`], so it is visible to the next
//! search issued through this layer before the write call returns. Writes are
//! idempotent per uid, which makes resending them after a timeout safe.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::IndexResult;
use crate::names::IndexNames;
use crate::retry::RetryPolicy;
use crate::store::{BulkItem, BulkOutcome, DynStoreClient, RefreshPolicy, WriteResponse};

/// A document to index.
///
/// The source is produced by the caller; this layer stores it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Document type; selects the sub-index.
    pub doc_type: String,
    /// Unique id within the sub-index.
    pub uid: String,
    /// Serialized document fields.
    pub source: Value,
}

impl IndexDocument {
    /// Creates a document.
    pub fn new(doc_type: impl Into<String>, uid: impl Into<String>, source: Value) -> Self {
        Self {
            doc_type: doc_type.into(),
            uid: uid.into(),
            source,
        }
    }
}

/// Upserts and deletes documents with bounded retry.
#[derive(Debug, Clone)]
pub struct DocumentWriter {
    client: DynStoreClient,
    names: IndexNames,
}

impl DocumentWriter {
    /// Creates a writer.
    pub fn new(client: DynStoreClient, names: IndexNames) -> Self {
        Self { client, names }
    }

    /// Creates or overwrites a single document.
    pub async fn upsert(
        &self,
        document: &IndexDocument,
        retry: RetryPolicy,
    ) -> IndexResult<WriteResponse> {
        let index = self.names.sub_index(&document.doc_type);

        let response = retry
            .run("upsert", || {
                self.client.index_document(
                    &index,
                    &document.uid,
                    &document.source,
                    RefreshPolicy::Immediate,
                )
            })
            .await?;

        debug!(index = %index, uid = %document.uid, result = %response.result, "Indexed document");
        Ok(response)
    }

    /// Creates or overwrites several documents in one request.
    ///
    /// The request as a whole is retried; items the store refuses are
    /// reported in the returned outcome and not retried individually.
    pub async fn bulk_upsert(
        &self,
        documents: &[IndexDocument],
        retry: RetryPolicy,
    ) -> IndexResult<BulkOutcome> {
        if documents.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let items: Vec<BulkItem> = documents
            .iter()
            .map(|document| BulkItem {
                index: self.names.sub_index(&document.doc_type),
                id: document.uid.clone(),
                source: document.source.clone(),
            })
            .collect();

        let outcome = retry
            .run("bulk_upsert", || {
                self.client.bulk_index(&items, RefreshPolicy::Immediate)
            })
            .await?;

        if outcome.is_success() {
            debug!(items = outcome.items, took_ms = outcome.took_ms, "Bulk indexed documents");
        } else {
            warn!(
                items = outcome.items,
                failed = outcome.failures.len(),
                "Bulk index request had failed items"
            );
        }
        Ok(outcome)
    }

    /// Deletes a document. Returns `false` if it did not exist.
    pub async fn delete(&self, doc_type: &str, uid: &str, retry: RetryPolicy) -> IndexResult<bool> {
        let index = self.names.sub_index(doc_type);

        let found = retry
            .run("delete", || {
                self.client
                    .delete_document(&index, uid, RefreshPolicy::Immediate)
            })
            .await?;

        debug!(index = %index, uid, found, "Deleted document");
        Ok(found)
    }
}
