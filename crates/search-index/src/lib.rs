//! Helios Search Index
//!
//! An access layer over an Elasticsearch-compatible document store. It owns
//! the lifecycle of a logical index made of one sub-index per document type,
//! provisions those sub-indices with a schema version record, writes and
//! deletes documents with bounded retry, and maps search hits back into typed
//! results.
//!
//! # Architecture
//!
//! - [`store`] - The [`StoreClient`] seam and its Elasticsearch implementation
//! - [`gate`] - Waits for the store to become reachable at startup
//! - [`provision`] - Creates sub-indices and checks their schema version
//! - [`writer`] - Single and bulk upserts, deletes
//! - [`search`] - Query building, execution, result mapping, terms
//! - [`schema`] - Settings and mapping resources
//! - [`error`] - Error types for all operations
//!
//! Every component issues its requests through one shared client. All
//! operations are async and run to completion on the calling task, retry
//! sleeps included.
//!
//! # Quick Start
//!
//! ```no_run
//! use helios_search_index::{
//!     IndexDocument, IndexSchema, RetryPolicy, SearchIndex, SearchIndexConfig, SearchQuery,
//!     SortDirection,
//! };
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let index = SearchIndex::new(
//!     SearchIndexConfig::default(),
//!     IndexSchema::new(1, ["event", "series"]),
//! )?;
//! index.start().await?;
//!
//! let retry = RetryPolicy::new(3, 500);
//! index
//!     .upsert(
//!         &IndexDocument::new("event", "e1", json!({ "title": "Lecture 1" })),
//!         retry,
//!     )
//!     .await?;
//!
//! let query = SearchQuery::new(["event"])
//!     .with_limit(20)
//!     .sort_by("title", SortDirection::Ascending);
//! let result = index
//!     .search(
//!         &query,
//!         |metadata| {
//!             metadata
//!                 .get_str("title")
//!                 .map(String::from)
//!                 .ok_or("missing title")
//!         },
//!         retry,
//!     )
//!     .await?;
//! println!("{} of {} hits", result.document_count, result.hit_count);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod gate;
pub mod index;
pub mod names;
pub mod provision;
pub mod retry;
pub mod schema;
pub mod search;
pub mod store;
pub mod writer;

pub use config::SearchIndexConfig;
pub use error::{ConfigError, ErrorKind, IndexError, IndexResult, SchemaError, StoreError};
pub use index::{IndexSchema, SearchIndex};
pub use names::IndexNames;
pub use retry::RetryPolicy;
pub use search::{
    MetadataValue, SearchMetadataCollection, SearchQuery, SearchResult, SearchResultItem,
    SortDirection,
};
pub use store::{DynStoreClient, ElasticsearchClient, StoreClient};
pub use writer::IndexDocument;
