//! Multi-cluster workload index
//!
//! Each environment is a cluster whose resources are mirrored into per-kind [`Store`]s by watches
//! that run for the lifetime of the process. Reads never touch the network: a workload is
//! decoded from the latest snapshot, its access-policy rules are checked against the workloads
//! they reference (possibly in other environments), and its status is synthesized from its sync
//! condition and its instances or runs.
//!
//! ```text
//! [ Application ] -> [ Workload ] -> [ resolved rules ] -> [ Status ]
//!                         ^                 |
//!                   [ Pod | Job ]     [ peer Workload ]
//! ```
//!
//! Nothing computed here is cached: every read rebuilds its result from the stores.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod apps;
mod cluster;
mod jobs;
pub mod mapper;
pub mod metrics;
mod peers;
mod persistence;
mod search;
mod store;

#[cfg(test)]
mod tests;

pub use self::{cluster::Cluster, search::SearchHit, store::Store};
use std::{collections::BTreeMap, sync::Arc};
use tokio::time;
use workload_api_core::ConversionError;
use workload_api_k8s_api::InvalidSelector;

/// The set of known environments, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct Environments(Arc<BTreeMap<String, Cluster>>);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown environment {0:?}")]
    UnknownEnvironment(String),

    #[error("failed to convert {name} in {environment}/{team}")]
    Conversion {
        environment: String,
        team: String,
        name: String,
        #[source]
        source: ConversionError,
    },

    #[error("failed to select resources in {environment}/{team}")]
    Selector {
        environment: String,
        team: String,
        #[source]
        source: InvalidSelector,
    },

    #[error("failed to render manifest for {name} in {environment}/{team}")]
    Manifest {
        environment: String,
        team: String,
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("shutdown before the application cache in {cluster} synced")]
    Cancelled { cluster: String },
}

// === impl Environments ===

impl Environments {
    const SYNC_POLL_INTERVAL: time::Duration = time::Duration::from_secs(2);

    pub fn new(clusters: impl IntoIterator<Item = Cluster>) -> Self {
        Self(Arc::new(
            clusters
                .into_iter()
                .map(|c| (c.name().to_string(), c))
                .collect(),
        ))
    }

    pub fn cluster(&self, environment: &str) -> Result<&Cluster, Error> {
        self.0
            .get(environment)
            .ok_or_else(|| Error::UnknownEnvironment(environment.to_string()))
    }

    /// All clusters, ordered by name.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.0.values()
    }

    pub fn contains(&self, environment: &str) -> bool {
        self.0.contains_key(environment)
    }

    /// Clusters selected by `filter`, where an empty filter selects every cluster.
    fn filtered<'a>(&'a self, filter: &'a [String]) -> impl Iterator<Item = &'a Cluster> + 'a {
        self.clusters()
            .filter(move |c| filter.is_empty() || filter.iter().any(|f| f == c.name()))
    }

    /// Waits until every cluster's application cache has synced.
    ///
    /// Optional caches may still be listing when this returns.
    pub async fn wait_synced(&self, shutdown: drain::Watch) -> Result<(), StartError> {
        for cluster in self.clusters() {
            while !cluster.apps().is_synced() {
                tracing::info!(cluster = %cluster.name(), "Waiting for applications to sync");
                tokio::select! {
                    _ = shutdown.clone().signaled() => {
                        return Err(StartError::Cancelled {
                            cluster: cluster.name().to_string(),
                        });
                    }
                    _ = time::sleep(Self::SYNC_POLL_INTERVAL) => {}
                }
            }
            tracing::debug!(cluster = %cluster.name(), "Applications synced");
        }
        Ok(())
    }
}

// === impl Error ===

impl Error {
    fn conversion(
        environment: &str,
        team: &str,
        name: &str,
    ) -> impl FnOnce(ConversionError) -> Self {
        let environment = environment.to_string();
        let team = team.to_string();
        let name = name.to_string();
        move |source| Self::Conversion {
            environment,
            team,
            name,
            source,
        }
    }

    fn selector(environment: &str, team: &str) -> impl FnOnce(InvalidSelector) -> Self {
        let environment = environment.to_string();
        let team = team.to_string();
        move |source| Self::Selector {
            environment,
            team,
            source,
        }
    }
}
