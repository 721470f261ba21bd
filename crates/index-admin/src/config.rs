//! Command-line configuration for `index-admin`.
//!
//! Every connection option can also be set through the environment.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEARCH_INDEX_LOG_LEVEL` | info | Log level |
//! | `SEARCH_INDEX_IDENTIFIER` | helios | Sub-index name prefix |
//! | `SEARCH_INDEX_NAME` | Elasticsearch | Display name used in logs |
//! | `SEARCH_INDEX_SCHEME` | http | Store scheme |
//! | `SEARCH_INDEX_HOSTNAME` | localhost | Store hostname |
//! | `SEARCH_INDEX_PORT` | 9200 | Store port |
//! | `SEARCH_INDEX_USERNAME` | - | Basic-auth username |
//! | `SEARCH_INDEX_PASSWORD` | - | Basic-auth password |
//! | `SEARCH_INDEX_RETRY_DELAY_ON_STARTUP` | 10000 | Delay between startup probes (ms) |
//! | `SEARCH_INDEX_REQUEST_TIMEOUT` | 30000 | Request timeout (ms) |
//! | `SEARCH_INDEX_MAX_RESULT_WINDOW` | 10000 | Maximum offset + limit of a query |
//! | `SEARCH_INDEX_SCHEMA_ROOTS` | - | Schema override directories (comma-separated) |
//! | `SEARCH_INDEX_DISABLE_CERT_VALIDATION` | false | Skip TLS certificate checks |
//! | `SEARCH_INDEX_TYPES` | - | Document types (comma-separated) |
//! | `SEARCH_INDEX_VERSION` | - | Expected schema version |

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use helios_search_index::{ConfigError, IndexSchema, SearchIndexConfig};

/// Search index administration.
#[derive(Debug, Clone, Parser)]
#[command(name = "index-admin")]
#[command(about = "Helios search index administration")]
pub struct AdminConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "SEARCH_INDEX_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Prefix of every sub-index name.
    #[arg(long, env = "SEARCH_INDEX_IDENTIFIER", default_value = "helios")]
    pub index_identifier: String,

    /// Display name of the index, used in logs only.
    #[arg(long, env = "SEARCH_INDEX_NAME", default_value = "Elasticsearch")]
    pub index_name: String,

    /// Scheme of the store (http or https).
    #[arg(long, env = "SEARCH_INDEX_SCHEME", default_value = "http")]
    pub scheme: String,

    /// Hostname of the store.
    #[arg(long, env = "SEARCH_INDEX_HOSTNAME", default_value = "localhost")]
    pub hostname: String,

    /// Port of the store.
    #[arg(long, env = "SEARCH_INDEX_PORT", default_value = "9200")]
    pub port: u16,

    /// Basic-auth username.
    #[arg(long, env = "SEARCH_INDEX_USERNAME")]
    pub username: Option<String>,

    /// Basic-auth password.
    #[arg(long, env = "SEARCH_INDEX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Delay between reachability probes at startup, in milliseconds.
    #[arg(
        long,
        env = "SEARCH_INDEX_RETRY_DELAY_ON_STARTUP",
        default_value = "10000",
        allow_negative_numbers = true
    )]
    pub retry_delay_on_startup: i64,

    /// Request timeout in milliseconds.
    #[arg(long, env = "SEARCH_INDEX_REQUEST_TIMEOUT", default_value = "30000")]
    pub request_timeout: u64,

    /// Maximum offset + limit of a single query.
    #[arg(long, env = "SEARCH_INDEX_MAX_RESULT_WINDOW", default_value = "10000")]
    pub max_result_window: u64,

    /// Directories searched for schema overrides, in order.
    #[arg(long, env = "SEARCH_INDEX_SCHEMA_ROOTS", value_delimiter = ',')]
    pub schema_roots: Vec<PathBuf>,

    /// Skip TLS certificate validation. Development only.
    #[arg(long, env = "SEARCH_INDEX_DISABLE_CERT_VALIDATION", default_value = "false")]
    pub disable_certificate_validation: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Administration commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Wait until the store reports a green or yellow cluster.
    Wait,

    /// Create missing sub-indices and check the schema version of existing ones.
    Provision(SchemaArgs),

    /// Delete and re-provision every sub-index.
    Clear(SchemaArgs),

    /// List the distinct values of a field. Read-only: sub-indices are
    /// neither created nor version-checked.
    Terms {
        /// Field to aggregate.
        #[arg(long)]
        field: String,

        /// Document type to aggregate over.
        #[arg(long = "type")]
        doc_type: String,

        /// Print the terms as a JSON array.
        #[arg(long)]
        json: bool,
    },
}

/// The document types and schema version a command works on.
#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Document types (comma-separated).
    #[arg(long, env = "SEARCH_INDEX_TYPES", value_delimiter = ',', required = true)]
    pub types: Vec<String>,

    /// Expected schema version.
    #[arg(long, env = "SEARCH_INDEX_VERSION")]
    pub version: u32,
}

impl SchemaArgs {
    /// Returns the schema description.
    pub fn schema(&self) -> IndexSchema {
        IndexSchema::new(
            self.version,
            self.types
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty()),
        )
    }
}

impl AdminConfig {
    /// Returns the search index configuration.
    pub fn index_config(&self) -> SearchIndexConfig {
        SearchIndexConfig {
            index_identifier: self.index_identifier.clone(),
            index_name: self.index_name.clone(),
            scheme: self.scheme.clone(),
            hostname: self.hostname.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            retry_delay_on_startup_ms: self.retry_delay_on_startup,
            request_timeout_ms: self.request_timeout,
            max_result_window: self.max_result_window,
            schema_roots: self.schema_roots.clone(),
            disable_certificate_validation: self.disable_certificate_validation,
        }
    }

    /// Validates the configuration before any store I/O.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_map_onto_index_config() {
        let config = AdminConfig::try_parse_from(["index-admin", "wait"]).unwrap();
        let index_config = config.index_config();

        assert!(matches!(config.command, Command::Wait));
        assert_eq!(index_config.index_identifier, "helios");
        assert_eq!(index_config.url(), "http://localhost:9200");
        assert_eq!(index_config.retry_delay_on_startup_ms, 10000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provision_arguments() {
        let config = AdminConfig::try_parse_from([
            "index-admin",
            "--index-identifier",
            "media",
            "--hostname",
            "search.internal",
            "provision",
            "--types",
            "event, series",
            "--version",
            "4",
        ])
        .unwrap();

        let Command::Provision(args) = &config.command else {
            panic!("expected provision, got {:?}", config.command);
        };
        let schema = args.schema();
        assert_eq!(schema.version, 4);
        assert_eq!(schema.types, vec!["event", "series"]);
        assert_eq!(config.index_config().url(), "http://search.internal:9200");
    }

    #[test]
    fn test_terms_arguments() {
        let config = AdminConfig::try_parse_from([
            "index-admin",
            "terms",
            "--field",
            "country",
            "--type",
            "event",
            "--json",
        ])
        .unwrap();

        match config.command {
            Command::Terms {
                field,
                doc_type,
                json,
            } => {
                assert_eq!(field, "country");
                assert_eq!(doc_type, "event");
                assert!(json);
            }
            other => panic!("expected terms, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_retry_delay_fails_validation() {
        let config = AdminConfig::try_parse_from([
            "index-admin",
            "--retry-delay-on-startup",
            "0",
            "wait",
        ])
        .unwrap();

        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRetryDelay { value: 0 })
        );
    }

    #[test]
    fn test_terms_takes_no_version() {
        assert!(
            AdminConfig::try_parse_from([
                "index-admin",
                "terms",
                "--field",
                "country",
                "--type",
                "event",
                "--version",
                "1",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_provision_requires_types() {
        assert!(AdminConfig::try_parse_from(["index-admin", "provision", "--version", "1"]).is_err());
    }
}
