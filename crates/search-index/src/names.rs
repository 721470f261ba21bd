//! Sub-index naming.

/// Id of the reserved document holding a sub-index's schema version.
pub const VERSION_RECORD_ID: &str = "root";

/// Maps document types to sub-index names and back.
///
/// Sub-indices are named `{identifier}_{type}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNames {
    identifier: String,
}

impl IndexNames {
    /// Creates a naming scheme for the given index identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// Returns the index identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the sub-index name for a document type.
    pub fn sub_index(&self, doc_type: &str) -> String {
        format!("{}_{}", self.identifier, doc_type)
    }

    /// Returns the sub-index names for several document types, in order.
    pub fn sub_indices<S: AsRef<str>>(&self, doc_types: &[S]) -> Vec<String> {
        doc_types
            .iter()
            .map(|doc_type| self.sub_index(doc_type.as_ref()))
            .collect()
    }

    /// Returns the document type a sub-index belongs to, if it is one of ours.
    pub fn doc_type_of<'a>(&self, index: &'a str) -> Option<&'a str> {
        index
            .strip_prefix(self.identifier.as_str())?
            .strip_prefix('_')
            .filter(|doc_type| !doc_type.is_empty())
    }
}
