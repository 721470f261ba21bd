//! Distinct field values via a terms aggregation.

use serde_json::{Value, json};
use tracing::debug;

use crate::error::IndexResult;
use crate::names::{IndexNames, VERSION_RECORD_ID};
use crate::store::{DynStoreClient, TermsBucket};

/// Name of the aggregation in requests and responses.
pub const TERMS_AGGREGATION_NAME: &str = "terms";

/// Number of buckets requested. The store's `search.max_buckets` is the
/// real ceiling.
pub const TERMS_AGGREGATION_SIZE: u64 = 10000;

/// Lists the distinct values of a field.
#[derive(Debug, Clone)]
pub struct TermsAggregator {
    client: DynStoreClient,
    names: IndexNames,
}

impl TermsAggregator {
    /// Creates an aggregator.
    pub fn new(client: DynStoreClient, names: IndexNames) -> Self {
        Self { client, names }
    }

    /// Returns the distinct values of `field` in the sub-index of
    /// `doc_type`, in the store's bucket order.
    pub async fn distinct_values(&self, field: &str, doc_type: &str) -> IndexResult<Vec<String>> {
        let index = self.names.sub_index(doc_type);

        let response = self
            .client
            .search(std::slice::from_ref(&index), &request_body(field))
            .await?;

        let terms: Vec<String> = response
            .terms_buckets(TERMS_AGGREGATION_NAME)?
            .iter()
            .map(TermsBucket::key_string)
            .collect();

        debug!(index = %index, field, terms = terms.len(), "Collected field terms");
        Ok(terms)
    }
}

fn request_body(field: &str) -> Value {
    json!({
        "size": 0,
        "query": {
            "bool": {
                "must_not": [
                    { "ids": { "values": [VERSION_RECORD_ID] } }
                ]
            }
        },
        "aggs": {
            TERMS_AGGREGATION_NAME: {
                "terms": {
                    "field": field,
                    "size": TERMS_AGGREGATION_SIZE
                }
            }
        }
    })
}
