//! Abstract search queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    #[default]
    Ascending,
    /// Descending order.
    Descending,
}

impl SortDirection {
    /// Returns the store's name for this direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl SortDirective {
    /// Parses a sort value (e.g., `"-created"` for descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(stripped) => Self {
                field: stripped.to_string(),
                direction: SortDirection::Descending,
            },
            None => Self {
                field: s.to_string(),
                direction: SortDirection::Ascending,
            },
        }
    }
}

/// A search over one or more document types.
///
/// Sort directives are applied in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Document types to search; their sub-indices are searched together.
    pub types: Vec<String>,
    /// Number of hits to skip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Maximum number of hits; `None` or 0 means the full result window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Fields to return; empty means all stored fields.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Sort order.
    #[serde(default)]
    pub sort: Vec<SortDirective>,
    /// Store-native query clause; `None` matches every document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
}

impl SearchQuery {
    /// Creates a query over the given document types.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Sets the offset.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restricts the returned fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a sort directive.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortDirective {
            field: field.into(),
            direction,
        });
        self
    }

    /// Sets the store-native query clause.
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_directive_parse() {
        let desc = SortDirective::parse("-created");
        assert_eq!(desc.field, "created");
        assert_eq!(desc.direction, SortDirection::Descending);

        let asc = SortDirective::parse("title");
        assert_eq!(asc.field, "title");
        assert_eq!(asc.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_builder_keeps_sort_order() {
        let query = SearchQuery::new(["event"])
            .sort_by("title", SortDirection::Ascending)
            .sort_by("created", SortDirection::Descending);

        let fields: Vec<&str> = query.sort.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "created"]);
    }
}
