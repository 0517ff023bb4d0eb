use crate::{
    clusters::{self, ClusterConfig, ClusterNames, StaticClusters},
    directory::StaticDirectory,
    impersonate::Impersonator,
    index::{self, Cluster, Environments},
    watches,
};
use anyhow::{bail, Result};
use clap::Parser;
use prometheus_client::registry::Registry;
use std::{path::PathBuf, sync::Arc};
use tracing::{info, info_span, Instrument};
use workload_api_core::TeamDirectory;

#[derive(Debug, Parser)]
#[clap(name = "workload-api", about = "Serves workloads mirrored from a fleet of clusters")]
pub struct Args {
    #[clap(long, default_value = "workload_api=info,warn", env = "WORKLOAD_API_LOG")]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    /// The tenant whose GCP clusters are reached.
    #[clap(long, default_value = "dev-nais", env = "TENANT")]
    tenant: String,

    /// GCP clusters, each becoming an environment of the same name.
    #[clap(long, env = "KUBERNETES_CLUSTERS")]
    clusters: Option<ClusterNames>,

    /// Clusters outside GCP, as comma-separated `name|host|token` entries.
    #[clap(long, env = "KUBERNETES_CLUSTERS_STATIC")]
    static_clusters: Option<StaticClusters>,

    /// Serves the cluster this process runs in as an environment with this name.
    #[clap(long, env = "KUBERNETES_CLUSTER_LOCAL")]
    local_cluster: Option<String>,

    /// A YAML file listing teams and their members.
    #[clap(long, env = "TEAMS_FILE")]
    teams_file: Option<PathBuf>,
}

/// What request handlers are built on.
#[derive(Clone)]
pub struct Services {
    pub environments: Environments,
    pub impersonator: Impersonator,
    pub directory: Arc<dyn TeamDirectory>,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let (runtime, _services) = self.start().await?;

        // Block the main thread on the shutdown signal. Once it fires, wait for the background
        // tasks to complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }

    /// Configures every environment, spawns its watches and returns once every application cache
    /// has synced.
    ///
    /// Optional caches may still be listing when this returns.
    pub async fn start(self) -> Result<(kubert::Runtime, Services)> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            tenant,
            clusters: gcp_clusters,
            static_clusters,
            local_cluster,
            teams_file,
        } = self;

        let mut configs = Vec::new();
        for name in gcp_clusters.map(|ClusterNames(c)| c).unwrap_or_default() {
            configs.push(ClusterConfig::gcp(&tenant, &name).await?);
        }
        for cluster in static_clusters.map(|StaticClusters(c)| c).unwrap_or_default() {
            configs.push(ClusterConfig::from_static(&cluster).await?);
        }
        if let Some(name) = &local_cluster {
            configs.push(ClusterConfig::local(name).await?);
        }
        if configs.is_empty() {
            bail!("no clusters configured");
        }

        // Capabilities must be known before the caches, and the caches before their metrics are
        // registered.
        let mut watched = Vec::with_capacity(configs.len());
        for config in &configs {
            let client = config.client()?;
            let capabilities = clusters::capabilities(&client, config.gcp).await;
            let cluster = Cluster::new(config.name.clone(), config.gcp, capabilities);
            watched.push((client, cluster));
        }
        let environments = Environments::new(watched.iter().map(|(_, c)| c.clone()));

        let mut prom = <Registry>::default();
        index::metrics::register(prom.sub_registry_with_prefix("cache"), environments.clone());
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        for (client, cluster) in &watched {
            info!(cluster = %cluster.name(), gcp = cluster.is_gcp(), "Watching cluster");
            watches::spawn(client, cluster);
        }

        let directory: Arc<dyn TeamDirectory> = match teams_file {
            Some(path) => Arc::new(StaticDirectory::load(&path).await?),
            None => {
                tracing::warn!("No team directory configured; no teams exist");
                Arc::new(StaticDirectory::default())
            }
        };

        // The runtime only reacts to signals once it runs, so start-up listens for them itself.
        let (signals, shutdown) = kubert::shutdown::sigint_or_sigterm()?;
        let signals = tokio::spawn(signals.signaled().instrument(info_span!("startup")));
        let synced = wait_for_caches(&environments, shutdown).await;
        signals.abort();
        synced?;

        let services = Services {
            impersonator: Impersonator::new(&configs, directory.clone()),
            environments,
            directory,
        };
        Ok((runtime, services))
    }
}

/// Waits for every environment's application cache, failing if `shutdown` is signaled first.
async fn wait_for_caches(environments: &Environments, shutdown: drain::Watch) -> Result<()> {
    environments.wait_synced(shutdown).await?;
    info!("Application caches synced");
    Ok(())
}
