//! Search results and per-hit metadata.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::names::IndexNames;
use crate::store::SearchHit;

use super::query::SearchQuery;

/// The value(s) of one returned field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A field with exactly one value.
    Single(Value),
    /// A multi-valued field, in stored order.
    List(Vec<Value>),
}

impl MetadataValue {
    /// Returns the first (or only) value.
    pub fn first(&self) -> Option<&Value> {
        match self {
            MetadataValue::Single(value) => Some(value),
            MetadataValue::List(values) => values.first(),
        }
    }

    /// Returns all values.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            MetadataValue::Single(value) => vec![value],
            MetadataValue::List(values) => values.iter().collect(),
        }
    }
}

/// Everything a hit returned, handed to the caller's mapping function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMetadataCollection {
    /// Document id.
    pub identifier: String,
    /// Document type, derived from the sub-index name.
    pub document_type: String,
    /// Sub-index the hit came from.
    pub index: String,
    /// Returned fields by name.
    pub fields: BTreeMap<String, MetadataValue>,
}

impl SearchMetadataCollection {
    /// Builds the metadata of a hit.
    ///
    /// Stored fields come as arrays: one element is a single value, anything
    /// else a list. A hit without stored fields falls back to its `_source`,
    /// where arrays are lists and everything else a single value.
    pub fn from_hit(hit: &SearchHit, names: &IndexNames) -> Self {
        let fields = if !hit.fields.is_empty() {
            stored_fields(&hit.fields)
        } else {
            match &hit.source {
                Some(Value::Object(source)) => source_fields(source),
                _ => BTreeMap::new(),
            }
        };

        Self {
            identifier: hit.id.clone(),
            document_type: names
                .doc_type_of(&hit.index)
                .unwrap_or(&hit.index)
                .to_string(),
            index: hit.index.clone(),
            fields,
        }
    }

    /// Returns a field by name.
    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields.get(name)
    }

    /// Returns the first value of a field as a string slice.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.first()?.as_str()
    }
}

fn stored_fields(fields: &Map<String, Value>) -> BTreeMap<String, MetadataValue> {
    fields
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Array(values) if values.len() == 1 => MetadataValue::Single(values[0].clone()),
                Value::Array(values) => MetadataValue::List(values.clone()),
                other => MetadataValue::Single(other.clone()),
            };
            (name.clone(), value)
        })
        .collect()
}

fn source_fields(source: &Map<String, Value>) -> BTreeMap<String, MetadataValue> {
    source
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Array(values) => MetadataValue::List(values.clone()),
                other => MetadataValue::Single(other.clone()),
            };
            (name.clone(), value)
        })
        .collect()
}

/// One mapped hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultItem<T> {
    /// Relevance score; absent when sorted by field.
    pub score: Option<f64>,
    /// The mapped document.
    pub document: T,
}

/// A page of mapped search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<T> {
    /// The query that produced this result.
    pub query: SearchQuery,
    /// Total number of matches reported by the store.
    pub hit_count: u64,
    /// Number of hits that were mapped successfully.
    pub document_count: u64,
    /// Time the store spent on the search, in milliseconds.
    pub search_time_ms: u64,
    /// The mapped hits, in store order.
    pub items: Vec<SearchResultItem<T>>,
}

impl<T> SearchResult<T> {
    /// Returns the offset of this page.
    pub fn offset(&self) -> u64 {
        self.query.offset.unwrap_or(0)
    }

    /// Returns the requested limit, if any.
    pub fn limit(&self) -> Option<u64> {
        self.query.limit.filter(|limit| *limit > 0)
    }

    /// Returns the mapped documents.
    pub fn documents(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|item| &item.document)
    }
}
