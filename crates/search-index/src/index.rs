//! The [`SearchIndex`] facade.

use std::fmt::Display;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SearchIndexConfig;
use crate::error::{IndexError, IndexResult};
use crate::gate::ConnectionGate;
use crate::names::IndexNames;
use crate::provision::Provisioner;
use crate::retry::RetryPolicy;
use crate::schema::SchemaResources;
use crate::search::{
    RequestBuilder, SearchExecutor, SearchMetadataCollection, SearchQuery, SearchRequest,
    SearchResult, TermsAggregator,
};
use crate::store::{BulkOutcome, DynStoreClient, ElasticsearchClient, WriteResponse};
use crate::writer::{DocumentWriter, IndexDocument};

/// The document types an index holds and the schema version they are at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Schema version the running code expects.
    pub version: u32,
    /// Document types, one sub-index each.
    pub types: Vec<String>,
}

impl IndexSchema {
    /// Creates a schema description.
    pub fn new<I, S>(version: u32, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version,
            types: types.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Created,
    Started { version: u32 },
    Stopped,
}

/// A search index backed by one sub-index per document type.
///
/// Lifecycle is `new` → [`start`](Self::start) → [`stop`](Self::stop).
/// Operations other than request building fail with
/// [`IndexError::NotStarted`] outside the started state.
#[derive(Debug)]
pub struct SearchIndex {
    config: SearchIndexConfig,
    schema: IndexSchema,
    names: IndexNames,
    gate: ConnectionGate,
    provisioner: Provisioner,
    writer: DocumentWriter,
    requests: RequestBuilder,
    executor: SearchExecutor,
    terms: TermsAggregator,
    state: RwLock<State>,
}

impl SearchIndex {
    /// Creates an index talking to the configured Elasticsearch cluster.
    ///
    /// The configuration is validated first; no request is sent.
    pub fn new(config: SearchIndexConfig, schema: IndexSchema) -> IndexResult<Self> {
        config.validate()?;
        let client: DynStoreClient = Arc::new(ElasticsearchClient::new(&config)?);
        Self::with_client(config, schema, client)
    }

    /// Creates an index on top of an existing store client.
    pub fn with_client(
        config: SearchIndexConfig,
        schema: IndexSchema,
        client: DynStoreClient,
    ) -> IndexResult<Self> {
        config.validate()?;

        let names = IndexNames::new(config.index_identifier.trim());
        let resources = SchemaResources::new(config.schema_roots.iter().cloned());

        Ok(Self {
            gate: ConnectionGate::new(
                client.clone(),
                config.url(),
                config.retry_delay_on_startup(),
            ),
            provisioner: Provisioner::new(client.clone(), names.clone(), resources),
            writer: DocumentWriter::new(client.clone(), names.clone()),
            requests: RequestBuilder::new(names.clone(), config.max_result_window),
            executor: SearchExecutor::new(client.clone(), names.clone()),
            terms: TermsAggregator::new(client, names.clone()),
            names,
            config,
            schema,
            state: RwLock::new(State::Created),
        })
    }

    /// Waits for the store and provisions every sub-index.
    ///
    /// Starting an index that is already started does nothing.
    pub async fn start(&self) -> IndexResult<()> {
        if self.index_version().is_some() {
            return Ok(());
        }

        info!(index = %self.config.index_name, url = %self.config.url(), "Starting search index");

        self.gate.wait_until_reachable().await?;
        self.provisioner
            .ensure(&self.schema.types, self.schema.version)
            .await?;

        *self.state.write() = State::Started {
            version: self.schema.version,
        };
        info!(
            index = %self.config.index_name,
            version = self.schema.version,
            types = self.schema.types.len(),
            "Search index started"
        );
        Ok(())
    }

    /// Stops the index. The store client stays usable for a later `start`.
    pub fn stop(&self) {
        let mut state = self.state.write();
        if *state != State::Stopped {
            *state = State::Stopped;
            info!(index = %self.config.index_name, "Search index stopped");
        }
    }

    /// Deletes and re-provisions every sub-index.
    pub async fn clear(&self) -> IndexResult<()> {
        let version = self.ensure_started()?;
        info!(index = %self.config.index_name, "Clearing search index");
        self.provisioner.clear(&self.schema.types, version).await
    }

    /// Creates or overwrites a document.
    pub async fn upsert(
        &self,
        document: &IndexDocument,
        retry: RetryPolicy,
    ) -> IndexResult<WriteResponse> {
        self.ensure_started()?;
        self.writer.upsert(document, retry).await
    }

    /// Creates or overwrites several documents in one request.
    pub async fn bulk_upsert(
        &self,
        documents: &[IndexDocument],
        retry: RetryPolicy,
    ) -> IndexResult<BulkOutcome> {
        self.ensure_started()?;
        self.writer.bulk_upsert(documents, retry).await
    }

    /// Deletes a document. Returns `false` if it did not exist.
    pub async fn delete(&self, doc_type: &str, uid: &str, retry: RetryPolicy) -> IndexResult<bool> {
        self.ensure_started()?;
        self.writer.delete(doc_type, uid, retry).await
    }

    /// Builds the store request for a query without sending it.
    pub fn build_request(&self, query: &SearchQuery) -> SearchRequest {
        self.requests.build(query)
    }

    /// Runs a query and maps each hit with `mapper`.
    pub async fn search<T, E, F>(
        &self,
        query: &SearchQuery,
        mapper: F,
        retry: RetryPolicy,
    ) -> IndexResult<SearchResult<T>>
    where
        F: Fn(&SearchMetadataCollection) -> Result<T, E>,
        E: Display,
    {
        self.ensure_started()?;
        let request = self.requests.build(query);
        self.executor.execute(query, &request, mapper, retry).await
    }

    /// Returns the distinct values of `field` for a document type.
    pub async fn terms_for_field(&self, field: &str, doc_type: &str) -> IndexResult<Vec<String>> {
        self.ensure_started()?;
        self.terms.distinct_values(field, doc_type).await
    }

    /// Returns the schema version while started.
    pub fn index_version(&self) -> Option<u32> {
        match *self.state.read() {
            State::Started { version } => Some(version),
            State::Created | State::Stopped => None,
        }
    }

    /// Returns the display name of the index.
    pub fn index_name(&self) -> &str {
        &self.config.index_name
    }

    /// Returns the sub-index naming scheme.
    pub fn names(&self) -> &IndexNames {
        &self.names
    }

    /// Returns the schema description.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    fn ensure_started(&self) -> IndexResult<u32> {
        self.index_version().ok_or_else(|| IndexError::NotStarted {
            index_name: self.config.index_name.clone(),
        })
    }
}
