//! Sub-index provisioning and schema version checks.

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{IndexResult, SchemaError, StoreError};
use crate::names::{IndexNames, VERSION_RECORD_ID};
use crate::schema::SchemaResources;
use crate::store::{DynStoreClient, RefreshPolicy};

/// Creates and validates one sub-index per document type.
#[derive(Debug, Clone)]
pub struct Provisioner {
    client: DynStoreClient,
    names: IndexNames,
    resources: SchemaResources,
}

impl Provisioner {
    /// Creates a provisioner.
    pub fn new(client: DynStoreClient, names: IndexNames, resources: SchemaResources) -> Self {
        Self {
            client,
            names,
            resources,
        }
    }

    /// Idempotently provisions the sub-index of every type at `version`.
    ///
    /// Existing sub-indices are kept. A stored version that differs from
    /// `version` fails with [`SchemaError::VersionMismatch`] and leaves the
    /// sub-index untouched.
    pub async fn ensure<S: AsRef<str>>(&self, doc_types: &[S], version: u32) -> IndexResult<()> {
        for doc_type in doc_types {
            self.ensure_sub_index(doc_type.as_ref(), version).await?;
        }
        Ok(())
    }

    /// Deletes every sub-index and provisions it again at `version`.
    ///
    /// Sub-indices that do not exist are skipped.
    pub async fn clear<S: AsRef<str>>(&self, doc_types: &[S], version: u32) -> IndexResult<()> {
        for index in self.names.sub_indices(doc_types) {
            match self.client.delete_index(&index).await {
                Ok(_) => info!(index = %index, "Deleted search sub-index"),
                Err(e) if e.is_not_found() => {
                    debug!(index = %index, "Search sub-index already absent");
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.ensure(doc_types, version).await
    }

    async fn ensure_sub_index(&self, doc_type: &str, version: u32) -> IndexResult<()> {
        let index = self.names.sub_index(doc_type);
        let body = self.resources.create_index_body(doc_type)?;

        match self.client.create_index(&index, body).await {
            Ok(true) => info!(index = %index, "Created search sub-index"),
            Ok(false) => return Err(SchemaError::NotAcknowledged { index }.into()),
            Err(e) if e.is_already_exists() => {
                debug!(index = %index, "Search sub-index already exists");
            }
            Err(e) => return Err(e.into()),
        }

        match self.client.get_document(&index, VERSION_RECORD_ID).await? {
            Some(record) => {
                let stored = parse_version(&index, &record)?;
                if stored != version {
                    return Err(SchemaError::VersionMismatch {
                        index,
                        stored,
                        expected: version,
                    }
                    .into());
                }
                debug!(index = %index, version, "Search sub-index version matches");
            }
            None => {
                self.write_version(&index, version).await?;
                info!(index = %index, version, "Wrote search sub-index version record");
            }
        }

        Ok(())
    }

    async fn write_version(&self, index: &str, version: u32) -> Result<(), StoreError> {
        self.client
            .index_document(
                index,
                VERSION_RECORD_ID,
                &json!({ "version": version }),
                RefreshPolicy::Immediate,
            )
            .await
            .map(|_| ())
    }
}

/// Reads the version from a version record.
///
/// Accepts both `{"version": 4}` and `{"version": "4"}`.
fn parse_version(index: &str, record: &Value) -> Result<u32, SchemaError> {
    let invalid = |message: String| SchemaError::InvalidVersionRecord {
        index: index.to_string(),
        message,
    };

    match record.get("version") {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| invalid(format!("version {} is out of range", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(format!("version '{}': {}", s, e))),
        Some(other) => Err(invalid(format!("unexpected version value {}", other))),
        None => Err(invalid("missing 'version' field".to_string())),
    }
}
