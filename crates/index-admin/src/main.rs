//! Helios search index administration.
//!
//! Waits for the search store, provisions or clears sub-indices, and lists
//! field terms.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use helios_search_index::gate::ConnectionGate;
use helios_search_index::search::TermsAggregator;
use helios_search_index::{
    DynStoreClient, ElasticsearchClient, IndexNames, IndexSchema, SearchIndex,
};
use tracing::info;

use crate::config::{AdminConfig, Command};

/// Installs the tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "helios_search_index={},helios_index_admin={}",
            level, level
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Waits until the store is reachable without touching any index.
async fn wait(config: &AdminConfig) -> anyhow::Result<DynStoreClient> {
    let index_config = config.index_config();
    let client: DynStoreClient = Arc::new(ElasticsearchClient::new(&index_config)?);

    ConnectionGate::new(
        client.clone(),
        index_config.url(),
        index_config.retry_delay_on_startup(),
    )
    .wait_until_reachable()
    .await?;
    Ok(client)
}

/// Creates and starts an index for `schema`.
async fn start_index(config: &AdminConfig, schema: IndexSchema) -> anyhow::Result<SearchIndex> {
    let index = SearchIndex::new(config.index_config(), schema)?;
    index
        .start()
        .await
        .with_context(|| format!("failed to start search index '{}'", index.index_name()))?;
    Ok(index)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdminConfig::parse();
    init_logging(&config.log_level);

    if let Err(error) = config.validate() {
        eprintln!("Configuration error: {}", error);
        std::process::exit(1);
    }

    info!(
        url = %config.index_config().url(),
        index_identifier = %config.index_identifier,
        "Starting index-admin"
    );

    match &config.command {
        Command::Wait => {
            wait(&config).await?;
        }
        Command::Provision(args) => {
            let index = start_index(&config, args.schema()).await?;
            info!(
                version = ?index.index_version(),
                types = ?index.schema().types,
                "Search index provisioned"
            );
            index.stop();
        }
        Command::Clear(args) => {
            let index = start_index(&config, args.schema()).await?;
            index.clear().await.context("failed to clear search index")?;
            info!(types = ?index.schema().types, "Search index cleared");
            index.stop();
        }
        Command::Terms {
            field,
            doc_type,
            json,
        } => {
            let client = wait(&config).await?;
            let terms = TermsAggregator::new(client, IndexNames::new(config.index_identifier.trim()))
                .distinct_values(field, doc_type)
                .await
                .with_context(|| format!("failed to collect terms of '{}'", field))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&terms)?);
            } else {
                for term in &terms {
                    println!("{}", term);
                }
            }
        }
    }

    Ok(())
}
