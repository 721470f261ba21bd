//! Startup gate that waits for the backing store to become reachable.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult, StoreError};
use crate::store::{DynStoreClient, HealthStatus};

/// Polls cluster health until the store is reachable.
#[derive(Debug, Clone)]
pub struct ConnectionGate {
    client: DynStoreClient,
    url: String,
    delay: Duration,
}

/// Outcome of a single probe.
enum Probe {
    Reachable,
    NotYet,
}

impl ConnectionGate {
    /// Creates a gate that sleeps `delay` between probes.
    pub fn new(client: DynStoreClient, url: impl Into<String>, delay: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            delay,
        }
    }

    /// Blocks the calling task until the cluster reports green or yellow.
    ///
    /// Unreachable stores and red clusters are retried without limit. Any
    /// other store error is fatal and returned as [`IndexError::Connection`].
    pub async fn wait_until_reachable(&self) -> IndexResult<()> {
        let mut probes: u64 = 0;

        loop {
            probes += 1;

            match self.probe().await? {
                Probe::Reachable => {
                    info!(url = %self.url, probes, "Search store is reachable");
                    return Ok(());
                }
                Probe::NotYet => {
                    debug!(
                        url = %self.url,
                        probes,
                        retry_in_ms = self.delay.as_millis(),
                        "Search store not reachable yet, waiting"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }

    async fn probe(&self) -> IndexResult<Probe> {
        match self.client.cluster_health(HealthStatus::Yellow).await {
            Ok(health) => match health.status {
                HealthStatus::Green => {
                    debug!(url = %self.url, "Search store cluster is green");
                    Ok(Probe::Reachable)
                }
                HealthStatus::Yellow => {
                    warn!(url = %self.url, "Search store cluster is yellow");
                    Ok(Probe::Reachable)
                }
                HealthStatus::Red => {
                    debug!(url = %self.url, timed_out = health.timed_out, "Search store cluster is red");
                    Ok(Probe::NotYet)
                }
            },
            Err(StoreError::Unreachable { message }) => {
                debug!(url = %self.url, error = %message, "Health probe could not connect");
                Ok(Probe::NotYet)
            }
            Err(source) => Err(IndexError::Connection {
                url: self.url.clone(),
                source,
            }),
        }
    }
}
