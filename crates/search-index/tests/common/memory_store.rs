//! In-memory store client.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use helios_search_index::StoreClient;
use helios_search_index::error::{StoreError, StoreResult};
use helios_search_index::store::{
    BulkItem, BulkItemFailure, BulkOutcome, ClusterHealth, HealthStatus, RefreshPolicy,
    SearchResponse, WriteResponse,
};

/// Store operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Health,
    CreateIndex,
    DeleteIndex,
    GetDocument,
    IndexDocument,
    Bulk,
    DeleteDocument,
    Search,
}

#[derive(Debug, Default)]
struct Inner {
    indices: BTreeMap<String, BTreeMap<String, Value>>,
    create_bodies: HashMap<String, Value>,
    health: VecDeque<StoreResult<ClusterHealth>>,
    failures: HashMap<Op, VecDeque<StoreError>>,
    calls: HashMap<Op, u32>,
    refresh: Vec<RefreshPolicy>,
    search_bodies: Vec<Value>,
    rejected_ids: HashSet<String>,
    unacknowledged_creates: bool,
}

/// An in-memory [`StoreClient`].
///
/// Health probes report green unless scripted otherwise. Searches return
/// every document of the addressed sub-indices (except `root`) with each
/// source field as a stored field, and answer terms aggregations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

pub fn unreachable() -> StoreError {
    StoreError::Unreachable {
        message: "Connection refused (os error 111)".to_string(),
    }
}

pub fn status(code: u16) -> StoreError {
    StoreError::from_response(code, &format!("status {}", code))
}

fn already_exists(index: &str) -> StoreError {
    StoreError::from_response(
        400,
        &json!({
            "error": {
                "type": "resource_already_exists_exception",
                "reason": format!("index [{}] already exists", index)
            },
            "status": 400
        })
        .to_string(),
    )
}

fn index_not_found(index: &str) -> StoreError {
    StoreError::from_response(
        404,
        &json!({
            "error": {
                "type": "index_not_found_exception",
                "reason": format!("no such index [{}]", index)
            },
            "status": 404
        })
        .to_string(),
    )
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `times` calls of `op` fail with `error`.
    pub fn fail(&self, op: Op, times: usize, error: StoreError) {
        let mut inner = self.inner.lock();
        let queue = inner.failures.entry(op).or_default();
        queue.extend(std::iter::repeat_n(error, times));
    }

    /// Queues health probe outcomes; once drained, probes report green.
    pub fn script_health(&self, outcomes: Vec<StoreResult<ClusterHealth>>) {
        self.inner.lock().health.extend(outcomes);
    }

    pub fn calls(&self, op: Op) -> u32 {
        self.inner.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn create_index(&self, index: &str) {
        self.inner
            .lock()
            .indices
            .entry(index.to_string())
            .or_default();
    }

    pub fn index_exists(&self, index: &str) -> bool {
        self.inner.lock().indices.contains_key(index)
    }

    pub fn index_names(&self) -> Vec<String> {
        self.inner.lock().indices.keys().cloned().collect()
    }

    pub fn create_body(&self, index: &str) -> Option<Value> {
        self.inner.lock().create_bodies.get(index).cloned()
    }

    pub fn put(&self, index: &str, id: &str, source: Value) {
        self.inner
            .lock()
            .indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source);
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.inner.lock().indices.get(index)?.get(id).cloned()
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.inner
            .lock()
            .indices
            .get(index)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    /// Refresh policies of every write, in order.
    pub fn refresh_policies(&self) -> Vec<RefreshPolicy> {
        self.inner.lock().refresh.clone()
    }

    /// Bodies of every search request, in order.
    pub fn search_bodies(&self) -> Vec<Value> {
        self.inner.lock().search_bodies.clone()
    }

    /// Makes bulk requests refuse documents with this id.
    pub fn reject_in_bulk(&self, id: &str) {
        self.inner.lock().rejected_ids.insert(id.to_string());
    }

    /// Makes index creation answer `acknowledged: false`.
    pub fn unacknowledge_creates(&self) {
        self.inner.lock().unacknowledged_creates = true;
    }

    /// Counts the call and pops an injected failure, if any.
    fn enter(&self, op: Op) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        *inner.calls.entry(op).or_default() += 1;
        match inner.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn stored_fields(source: &Value) -> Map<String, Value> {
    match source {
        Value::Object(fields) => fields
            .iter()
            .map(|(name, value)| {
                let values = match value {
                    Value::Array(values) => Value::Array(values.clone()),
                    other => Value::Array(vec![other.clone()]),
                };
                (name.clone(), values)
            })
            .collect(),
        _ => Map::new(),
    }
}

fn terms_aggregation(docs: &[(&String, &String, &Value)], field: &str) -> Value {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for (_, _, source) in docs {
        let values = match source.get(field) {
            Some(Value::Array(values)) => values.clone(),
            Some(value) => vec![value.clone()],
            None => vec![],
        };
        let distinct: HashSet<String> = values
            .iter()
            .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
            .collect();
        for key in distinct {
            *counts.entry(key).or_default() += 1;
        }
    }

    // doc_count descending, then key ascending
    let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    json!({
        "buckets": buckets
            .into_iter()
            .map(|(key, doc_count)| json!({ "key": key, "doc_count": doc_count }))
            .collect::<Vec<_>>()
    })
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn cluster_health(&self, _wait_for: HealthStatus) -> StoreResult<ClusterHealth> {
        self.enter(Op::Health)?;
        let scripted = self.inner.lock().health.pop_front();
        scripted.unwrap_or(Ok(ClusterHealth {
            status: HealthStatus::Green,
            timed_out: false,
        }))
    }

    async fn create_index(&self, index: &str, body: Value) -> StoreResult<bool> {
        self.enter(Op::CreateIndex)?;
        let mut inner = self.inner.lock();
        if inner.indices.contains_key(index) {
            return Err(already_exists(index));
        }
        if inner.unacknowledged_creates {
            return Ok(false);
        }
        inner.indices.insert(index.to_string(), BTreeMap::new());
        inner.create_bodies.insert(index.to_string(), body);
        Ok(true)
    }

    async fn delete_index(&self, index: &str) -> StoreResult<bool> {
        self.enter(Op::DeleteIndex)?;
        let mut inner = self.inner.lock();
        match inner.indices.remove(index) {
            Some(_) => Ok(true),
            None => Err(index_not_found(index)),
        }
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Option<Value>> {
        self.enter(Op::GetDocument)?;
        let inner = self.inner.lock();
        match inner.indices.get(index) {
            Some(docs) => Ok(docs.get(id).cloned()),
            None => Err(index_not_found(index)),
        }
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
        refresh: RefreshPolicy,
    ) -> StoreResult<WriteResponse> {
        self.enter(Op::IndexDocument)?;
        let mut inner = self.inner.lock();
        inner.refresh.push(refresh);
        let previous = inner
            .indices
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), source.clone());
        Ok(WriteResponse {
            index: index.to_string(),
            id: id.to_string(),
            result: if previous.is_some() { "updated" } else { "created" }.to_string(),
            version: Some(1),
        })
    }

    async fn bulk_index(
        &self,
        items: &[BulkItem],
        refresh: RefreshPolicy,
    ) -> StoreResult<BulkOutcome> {
        self.enter(Op::Bulk)?;
        let mut inner = self.inner.lock();
        inner.refresh.push(refresh);

        let mut failures = Vec::new();
        for item in items {
            if inner.rejected_ids.contains(&item.id) {
                failures.push(BulkItemFailure {
                    index: item.index.clone(),
                    id: item.id.clone(),
                    status: 400,
                    error_type: Some("mapper_parsing_exception".to_string()),
                    reason: "failed to parse".to_string(),
                });
                continue;
            }
            inner
                .indices
                .entry(item.index.clone())
                .or_default()
                .insert(item.id.clone(), item.source.clone());
        }

        Ok(BulkOutcome {
            took_ms: 1,
            items: items.len(),
            failures,
        })
    }

    async fn delete_document(
        &self,
        index: &str,
        id: &str,
        refresh: RefreshPolicy,
    ) -> StoreResult<bool> {
        self.enter(Op::DeleteDocument)?;
        let mut inner = self.inner.lock();
        inner.refresh.push(refresh);
        match inner.indices.get_mut(index) {
            Some(docs) => Ok(docs.remove(id).is_some()),
            None => Err(index_not_found(index)),
        }
    }

    async fn search(&self, indices: &[String], body: &Value) -> StoreResult<SearchResponse> {
        self.enter(Op::Search)?;
        let mut inner = self.inner.lock();
        inner.search_bodies.push(body.clone());

        if let Some(missing) = indices.iter().find(|i| !inner.indices.contains_key(*i)) {
            return Err(index_not_found(missing));
        }

        let docs: Vec<(&String, &String, &Value)> = indices
            .iter()
            .filter_map(|index| inner.indices.get_key_value(index))
            .flat_map(|(index, docs)| docs.iter().map(move |(id, source)| (index, id, source)))
            .filter(|(_, id, _)| id.as_str() != "root")
            .collect();

        let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
        let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;

        let hits: Vec<Value> = docs
            .iter()
            .skip(from)
            .take(size)
            .map(|(index, id, source)| {
                json!({
                    "_index": index,
                    "_id": id,
                    "_score": 1.0,
                    "fields": stored_fields(source)
                })
            })
            .collect();

        let mut response = json!({
            "took": 2,
            "timed_out": false,
            "hits": {
                "total": { "value": docs.len(), "relation": "eq" },
                "hits": hits
            }
        });

        if let Some(field) = body
            .pointer("/aggs/terms/terms/field")
            .and_then(Value::as_str)
        {
            response["aggregations"] = json!({ "terms": terms_aggregation(&docs, field) });
        }

        Ok(serde_json::from_value(response)?)
    }
}
