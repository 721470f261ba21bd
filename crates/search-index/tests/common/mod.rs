//! Test infrastructure for the search-index layer.
//!
//! [`MemoryStore`] is an in-memory [`StoreClient`](helios_search_index::StoreClient)
//! with failure injection and per-operation call counters.

#![allow(dead_code)]

pub mod fixtures;
pub mod memory_store;

pub use fixtures::*;
pub use memory_store::*;
