//! Translates [`SearchQuery`] into a store search request.

use serde_json::{Value, json};

use crate::names::{IndexNames, VERSION_RECORD_ID};

use super::query::{SearchQuery, SortDirective};

/// Sorting by this field orders by the number of entries in its array
/// through a script instead of by the field value.
pub const PUBLICATION_COUNT_SORT_FIELD: &str = "publication";

/// A complete search request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Sub-indices to search.
    pub indices: Vec<String>,
    /// First hit returned, if set.
    pub from: Option<u64>,
    /// Number of hits requested.
    pub size: u64,
    /// The request body.
    pub body: Value,
}

/// Builds search requests bounded by a maximum result window.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    names: IndexNames,
    max_result_window: u64,
}

impl RequestBuilder {
    /// Creates a builder.
    pub fn new(names: IndexNames, max_result_window: u64) -> Self {
        Self {
            names,
            max_result_window,
        }
    }

    /// Builds the request for a query.
    ///
    /// `from + size` never exceeds the result window; the store rejects
    /// requests that reach past it. An offset at or past the window is
    /// pinned to the window, which yields the hit count and no hits.
    pub fn build(&self, query: &SearchQuery) -> SearchRequest {
        let from = query.offset.map(|offset| offset.min(self.max_result_window));
        let size = self.size(query);

        let mut body = json!({
            "query": self.build_query(query),
            "track_total_hits": true,
            "size": size,
        });

        if query.fields.is_empty() {
            body["stored_fields"] = json!(["*"]);
            body["_source"] = json!(true);
        } else {
            body["stored_fields"] = json!(query.fields);
        }

        if let Some(from) = from {
            body["from"] = json!(from);
        }

        if !query.sort.is_empty() {
            body["sort"] = Value::Array(query.sort.iter().map(build_sort_clause).collect());
        }

        SearchRequest {
            indices: self.names.sub_indices(&query.types),
            from,
            size,
            body,
        }
    }

    fn size(&self, query: &SearchQuery) -> u64 {
        let requested = query
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(self.max_result_window);
        let remaining = self
            .max_result_window
            .saturating_sub(query.offset.unwrap_or(0));
        requested.min(remaining)
    }

    fn build_query(&self, query: &SearchQuery) -> Value {
        let must = query
            .query
            .clone()
            .unwrap_or_else(|| json!({ "match_all": {} }));

        // The version record lives in every sub-index but is not a document
        json!({
            "bool": {
                "must": [must],
                "must_not": [
                    { "ids": { "values": [VERSION_RECORD_ID] } }
                ]
            }
        })
    }
}

fn build_sort_clause(directive: &SortDirective) -> Value {
    let order = directive.direction.as_str();

    if directive.field == PUBLICATION_COUNT_SORT_FIELD {
        return json!({
            "_script": {
                "type": "number",
                "script": {
                    "lang": "painless",
                    "source": "params._source.publication.length"
                },
                "order": order
            }
        });
    }

    let mut clause = serde_json::Map::new();
    clause.insert(directive.field.clone(), json!({ "order": order }));
    Value::Object(clause)
}
