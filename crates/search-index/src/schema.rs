//! Settings and mapping definitions for sub-indices.
//!
//! Resources are looked up by file name in the configured roots, in order,
//! and then among the defaults built into this crate. The first match wins.
//! A type without its own `{type}-mapping.json` uses `default-mapping.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::debug;

use crate::error::SchemaError;

/// File name of the shared index settings.
pub const SETTINGS_RESOURCE: &str = "indexSettings.json";

/// File name of the mapping used by types without their own.
pub const DEFAULT_MAPPING_RESOURCE: &str = "default-mapping.json";

const BUILTIN_RESOURCES: &[(&str, &str)] = &[
    (
        SETTINGS_RESOURCE,
        include_str!("../resources/indexSettings.json"),
    ),
    (
        DEFAULT_MAPPING_RESOURCE,
        include_str!("../resources/default-mapping.json"),
    ),
];

/// Returns the mapping resource name for a document type.
pub fn mapping_resource(doc_type: &str) -> String {
    format!("{}-mapping.json", doc_type)
}

/// Ordered lookup of schema resources.
#[derive(Debug, Clone, Default)]
pub struct SchemaResources {
    roots: Vec<PathBuf>,
}

impl SchemaResources {
    /// Creates a lookup over the given override roots.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    /// Returns the configured override roots.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Loads and parses a resource, or `None` if no root provides it.
    pub fn find(&self, name: &str) -> Result<Option<Value>, SchemaError> {
        for root in &self.roots {
            let path = root.join(name);
            if path.is_file() {
                debug!(resource = name, path = %path.display(), "Loading schema resource");
                return read_resource(name, &path).map(Some);
            }
        }

        match BUILTIN_RESOURCES.iter().find(|(builtin, _)| *builtin == name) {
            Some((_, content)) => {
                debug!(resource = name, "Loading built-in schema resource");
                parse_resource(name, content).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Loads a resource that must exist.
    pub fn load(&self, name: &str) -> Result<Value, SchemaError> {
        self.find(name)?.ok_or_else(|| SchemaError::MissingResource {
            name: name.to_string(),
        })
    }

    /// Returns the shared index settings.
    pub fn settings(&self) -> Result<Value, SchemaError> {
        self.load(SETTINGS_RESOURCE)
    }

    /// Returns the mapping for a document type, falling back to the default.
    pub fn mapping(&self, doc_type: &str) -> Result<Value, SchemaError> {
        match self.find(&mapping_resource(doc_type))? {
            Some(mapping) => Ok(mapping),
            None => self.load(DEFAULT_MAPPING_RESOURCE),
        }
    }

    /// Returns the create-index body for a document type.
    pub fn create_index_body(&self, doc_type: &str) -> Result<Value, SchemaError> {
        Ok(json!({
            "settings": self.settings()?,
            "mappings": self.mapping(doc_type)?,
        }))
    }
}

fn read_resource(name: &str, path: &Path) -> Result<Value, SchemaError> {
    let content = fs::read_to_string(path).map_err(|e| SchemaError::InvalidResource {
        name: name.to_string(),
        message: format!("{}: {}", path.display(), e),
    })?;
    parse_resource(name, &content)
}

fn parse_resource(name: &str, content: &str) -> Result<Value, SchemaError> {
    serde_json::from_str(content).map_err(|e| SchemaError::InvalidResource {
        name: name.to_string(),
        message: e.to_string(),
    })
}
