//! Runs search requests and maps hits into typed results.

use std::fmt::Display;

use tracing::{debug, warn};

use crate::error::IndexResult;
use crate::names::IndexNames;
use crate::retry::RetryPolicy;
use crate::store::{DynStoreClient, SearchResponse};

use super::query::SearchQuery;
use super::request::SearchRequest;
use super::result::{SearchMetadataCollection, SearchResult, SearchResultItem};

/// Executes search requests with bounded retry.
#[derive(Debug, Clone)]
pub struct SearchExecutor {
    client: DynStoreClient,
    names: IndexNames,
}

impl SearchExecutor {
    /// Creates an executor.
    pub fn new(client: DynStoreClient, names: IndexNames) -> Self {
        Self { client, names }
    }

    /// Sends `request` and maps every hit with `mapper`.
    ///
    /// Hits the mapper rejects are logged and skipped: they reduce
    /// `document_count` but never `hit_count`, which is the store's total.
    pub async fn execute<T, E, F>(
        &self,
        query: &SearchQuery,
        request: &SearchRequest,
        mapper: F,
        retry: RetryPolicy,
    ) -> IndexResult<SearchResult<T>>
    where
        F: Fn(&SearchMetadataCollection) -> Result<T, E>,
        E: Display,
    {
        let response = retry
            .run("search", || {
                self.client.search(&request.indices, &request.body)
            })
            .await?;

        Ok(self.map_response(query, response, mapper))
    }

    fn map_response<T, E, F>(
        &self,
        query: &SearchQuery,
        response: SearchResponse,
        mapper: F,
    ) -> SearchResult<T>
    where
        F: Fn(&SearchMetadataCollection) -> Result<T, E>,
        E: Display,
    {
        let hit_count = response.total_hits();
        let mut items = Vec::with_capacity(response.hits.hits.len());

        for hit in &response.hits.hits {
            let metadata = SearchMetadataCollection::from_hit(hit, &self.names);
            match mapper(&metadata) {
                Ok(document) => items.push(SearchResultItem {
                    score: hit.score,
                    document,
                }),
                Err(e) => warn!(
                    index = %hit.index,
                    id = %hit.id,
                    error = %e,
                    "Skipping search hit that could not be mapped"
                ),
            }
        }

        debug!(
            hit_count,
            returned = items.len(),
            took_ms = response.took,
            "Search completed"
        );

        SearchResult {
            query: query.clone(),
            hit_count,
            document_count: items.len() as u64,
            search_time_ms: response.took,
            items,
        }
    }
}
