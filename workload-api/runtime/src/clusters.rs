use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use serde_json::json;
use std::{fmt, str::FromStr};
use workload_api_k8s_api::Kind;

/// How to reach one environment's API server.
#[derive(Clone)]
pub struct ClusterConfig {
    pub name: String,
    pub gcp: bool,
    pub config: kube::Config,
}

/// An environment outside GCP, reached with a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCluster {
    pub name: String,
    pub host: String,
    pub token: String,
}

/// A comma-separated list of `name|host|token` entries.
#[derive(Clone, Debug, Default)]
pub struct StaticClusters(pub Vec<StaticCluster>);

/// A comma-separated list of GCP cluster names.
#[derive(Clone, Debug, Default)]
pub struct ClusterNames(pub Vec<String>);

#[derive(Debug, thiserror::Error)]
#[error("invalid static cluster entry {entry:?}: {reason}")]
pub struct InvalidStaticCluster {
    entry: String,
    reason: &'static str,
}

// === impl ClusterConfig ===

impl ClusterConfig {
    /// A tenant's GCP cluster, authenticated with the GKE credential plugin.
    pub async fn gcp(tenant: &str, name: &str) -> Result<Self> {
        let server = format!("https://apiserver.{name}.{tenant}.cloud.nais.io");
        let user = json!({
            "exec": {
                "apiVersion": "client.authentication.k8s.io/v1beta1",
                "command": "gke-gcloud-auth-plugin",
                "provideClusterInfo": true,
                "interactiveMode": "Never",
            },
        });
        let config = from_kubeconfig(name, &server, user)
            .await
            .with_context(|| format!("failed to configure cluster {name}"))?;
        Ok(Self {
            name: name.to_string(),
            gcp: true,
            config,
        })
    }

    pub async fn from_static(cluster: &StaticCluster) -> Result<Self> {
        let server = if cluster.host.contains("://") {
            cluster.host.clone()
        } else {
            format!("https://{}", cluster.host)
        };
        let user = json!({ "token": cluster.token });
        let config = from_kubeconfig(&cluster.name, &server, user)
            .await
            .with_context(|| format!("failed to configure static cluster {}", cluster.name))?;
        Ok(Self {
            name: cluster.name.clone(),
            gcp: false,
            config,
        })
    }

    /// The cluster this process runs in (or the current kubeconfig context).
    pub async fn local(name: &str) -> Result<Self> {
        let config = kube::Config::infer()
            .await
            .with_context(|| format!("failed to infer configuration for cluster {name}"))?;
        Ok(Self {
            name: name.to_string(),
            gcp: false,
            config,
        })
    }

    pub fn client(&self) -> Result<kube::Client> {
        kube::Client::try_from(self.config.clone())
            .with_context(|| format!("failed to build client for cluster {}", self.name))
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("name", &self.name)
            .field("gcp", &self.gcp)
            .field("cluster_url", &self.config.cluster_url)
            .finish()
    }
}

async fn from_kubeconfig(
    name: &str,
    server: &str,
    user: serde_json::Value,
) -> Result<kube::Config> {
    let kubeconfig: Kubeconfig = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Config",
        "clusters": [{ "name": name, "cluster": { "server": server } }],
        "users": [{ "name": name, "user": user }],
        "contexts": [{ "name": name, "context": { "cluster": name, "user": name } }],
        "current-context": name,
    }))?;
    let config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await?;
    Ok(config)
}

/// Discovers which optional kinds the cluster serves. GCP-only kinds are not probed outside GCP.
pub async fn capabilities(client: &kube::Client, gcp: bool) -> Vec<Kind> {
    let mut kinds = Vec::new();
    for kind in Kind::OPTIONAL {
        if kind.is_gcp_only() && !gcp {
            continue;
        }
        if api_resource_exists(client, kind).await {
            kinds.push(kind);
        } else {
            tracing::debug!(%kind, "Resource kind not served; skipping watch");
        }
    }
    kinds
}

async fn api_resource_exists(client: &kube::Client, kind: Kind) -> bool {
    client
        .list_api_group_resources(&kind.group_version())
        .await
        .ok()
        .iter()
        .flat_map(|r| r.resources.iter())
        .any(|r| r.name == kind.plural())
}

// === impl StaticCluster ===

impl FromStr for StaticCluster {
    type Err = InvalidStaticCluster;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| InvalidStaticCluster {
            entry: entry.to_string(),
            reason,
        };

        let parts = entry.split('|').map(str::trim).collect::<Vec<_>>();
        let [name, host, token] = parts.as_slice() else {
            return Err(invalid("must be on the form name|host|token"));
        };
        if name.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if host.is_empty() {
            return Err(invalid("host must not be empty"));
        }
        if token.is_empty() {
            return Err(invalid("token must not be empty"));
        }

        Ok(Self {
            name: name.to_string(),
            host: host.to_string(),
            token: token.to_string(),
        })
    }
}

impl fmt::Debug for StaticCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCluster")
            .field("name", &self.name)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl FromStr for StaticClusters {
    type Err = InvalidStaticCluster;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl FromStr for ClusterNames {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            s.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect(),
        ))
    }
}
