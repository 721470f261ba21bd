//! Searching the index.
//!
//! A [`SearchQuery`] is turned into a [`SearchRequest`] by the
//! [`RequestBuilder`], sent by the [`SearchExecutor`], and every hit is handed
//! to a caller-supplied mapping function as a [`SearchMetadataCollection`].

pub mod executor;
pub mod query;
pub mod request;
pub mod result;
pub mod terms;

pub use executor::SearchExecutor;
pub use query::{SearchQuery, SortDirection, SortDirective};
pub use request::{PUBLICATION_COUNT_SORT_FIELD, RequestBuilder, SearchRequest};
pub use result::{MetadataValue, SearchMetadataCollection, SearchResult, SearchResultItem};
pub use terms::TermsAggregator;
