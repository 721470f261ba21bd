//! Wire types for store responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Response of an index (write) request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteResponse {
    /// Index the document was written to.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// `created`, `updated`, ...
    #[serde(default)]
    pub result: String,
    /// Document version after the write.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
}

/// Response of a search request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Time the store spent on the search, in milliseconds.
    #[serde(default)]
    pub took: u64,
    /// Whether the search timed out on some shards.
    #[serde(default)]
    pub timed_out: bool,
    /// The hits section.
    #[serde(default)]
    pub hits: SearchHits,
    /// Aggregation results keyed by aggregation name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Map<String, Value>>,
}

/// The `hits` section of a search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHits {
    /// Total number of matching documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    /// The returned page of hits.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

/// Total hit count, in either of the encodings the store uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    /// Object form: `{"value": 12, "relation": "eq"}`.
    Object {
        value: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },
    /// Legacy integer form.
    Count(u64),
}

impl TotalHits {
    /// Returns the hit count.
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Object { value, .. } => *value,
            TotalHits::Count(value) => *value,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The sub-index the hit came from.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score; absent when sorting by field.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Returned stored fields; each value is an array.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    /// Document source, when requested.
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// A bucket of a terms aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermsBucket {
    /// Bucket key.
    pub key: Value,
    /// String rendering of non-string keys (dates, booleans).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,
    /// Number of documents in the bucket.
    #[serde(default)]
    pub doc_count: u64,
}

impl TermsBucket {
    /// Returns the bucket key as a string.
    pub fn key_string(&self) -> String {
        match (&self.key, &self.key_as_string) {
            (Value::String(s), _) => s.clone(),
            (_, Some(s)) => s.clone(),
            (other, None) => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TermsAggregation {
    #[serde(default)]
    buckets: Vec<TermsBucket>,
}

impl SearchResponse {
    /// Returns the total hit count reported by the store.
    pub fn total_hits(&self) -> u64 {
        self.hits.total.as_ref().map(TotalHits::value).unwrap_or(0)
    }

    /// Returns the buckets of the named terms aggregation, in store order.
    pub fn terms_buckets(&self, name: &str) -> StoreResult<Vec<TermsBucket>> {
        let aggregation = self
            .aggregations
            .as_ref()
            .and_then(|aggs| aggs.get(name))
            .ok_or_else(|| StoreError::Decode {
                message: format!("aggregation '{}' missing from search response", name),
            })?;
        let parsed: TermsAggregation = serde_json::from_value(aggregation.clone())?;
        Ok(parsed.buckets)
    }
}
