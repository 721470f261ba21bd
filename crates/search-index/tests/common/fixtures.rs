//! Shared configuration and fixtures.

use std::sync::Arc;

use serde_json::{Value, json};

use helios_search_index::{DynStoreClient, IndexDocument, IndexSchema, SearchIndex, SearchIndexConfig};

use super::memory_store::MemoryStore;

/// Startup probe delay used by tests, in milliseconds.
pub const TEST_RETRY_DELAY_MS: i64 = 1000;

pub fn test_config() -> SearchIndexConfig {
    SearchIndexConfig {
        index_identifier: "test".to_string(),
        index_name: "Test Index".to_string(),
        retry_delay_on_startup_ms: TEST_RETRY_DELAY_MS,
        ..Default::default()
    }
}

pub fn test_schema(version: u32) -> IndexSchema {
    IndexSchema::new(version, ["event", "series"])
}

pub fn create_index(store: &Arc<MemoryStore>, version: u32) -> SearchIndex {
    let client: DynStoreClient = store.clone();
    SearchIndex::with_client(test_config(), test_schema(version), client)
        .expect("valid test configuration")
}

/// Creates an index and starts it against `store`.
pub async fn started_index(store: &Arc<MemoryStore>, version: u32) -> SearchIndex {
    let index = create_index(store, version);
    index.start().await.expect("index starts");
    index
}

pub fn event(uid: &str, title: &str, country: &str) -> IndexDocument {
    IndexDocument::new(
        "event",
        uid,
        json!({ "title": title, "country": country, "presenters": ["Ada", "Grace"] }),
    )
}

/// Maps metadata to the event title.
pub fn title_of(
    metadata: &helios_search_index::SearchMetadataCollection,
) -> Result<String, String> {
    metadata
        .get_str("title")
        .map(String::from)
        .ok_or_else(|| format!("{} has no title", metadata.identifier))
}

pub fn version_record(version: u32) -> Value {
    json!({ "version": version })
}
