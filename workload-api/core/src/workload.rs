use crate::{AccessPolicy, Ident, Status};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    App,
    Job,
}

/// An application or job deployed by a team into an environment.
///
/// Workloads are built fresh for every read and are owned by the caller that built them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Workload {
    pub id: Ident,
    pub kind: WorkloadKind,
    pub name: String,
    pub team: String,
    pub environment: String,
    pub image: String,
    pub access_policy: AccessPolicy,
    pub resources: Resources,
    pub deploy_info: DeployInfo,
    pub authz: Vec<Authz>,
    pub ingresses: Vec<String>,
    pub variables: Vec<Variable>,
    pub secret_names: Vec<String>,
    pub schedule: Option<JobSchedule>,
    pub integrations: Integrations,
    pub status: Status,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeployInfo {
    pub deployer: Option<String>,
    pub commit_sha: Option<String>,
    pub url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resources {
    pub limits: ResourceAmounts,
    pub requests: ResourceAmounts,
    pub scaling: Scaling,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceAmounts {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Scaling {
    pub min: i32,
    pub max: i32,
    pub strategies: Vec<ScalingStrategy>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScalingStrategy {
    Cpu {
        threshold: i32,
    },
    KafkaLag {
        threshold: i32,
        consumer_group: String,
        topic: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authz {
    AzureAd { application: bool, sidecar: bool },
    IdPorten,
    Maskinporten { consumes: Vec<String>, exposes: Vec<String> },
    TokenX,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct JobSchedule {
    pub schedule: Option<String>,
    pub completions: Option<i32>,
    pub parallelism: Option<i32>,
    pub retries: i32,
}

/// Backing services a workload declares in its own spec.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Integrations {
    pub sql_instances: Vec<SqlInstanceRef>,
    pub opensearch: Option<ServiceRef>,
    pub valkey: Vec<ServiceRef>,
    pub kafka: Option<KafkaRef>,
}

/// A declared SQL instance. The name defaults to the workload's name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SqlInstanceRef {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub tier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ServiceRef {
    pub instance: String,
    pub access: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KafkaRef {
    pub pool: String,
    pub streams: bool,
}

// === impl WorkloadKind ===

impl WorkloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Job => "job",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// === impl Workload ===

impl Workload {
    /// The deployed revision, used to tag status errors.
    pub fn revision(&self) -> &str {
        self.deploy_info.commit_sha.as_deref().unwrap_or_default()
    }

    pub fn has_scaling_bounds(&self) -> bool {
        self.resources.scaling.min > 0 && self.resources.scaling.max > 0
    }
}

#[cfg(test)]
pub(crate) fn mk_workload(kind: WorkloadKind, environment: &str, team: &str, name: &str) -> Workload {
    let id = match kind {
        WorkloadKind::App => Ident::app(environment, team, name),
        WorkloadKind::Job => Ident::job(environment, team, name),
    };
    Workload {
        id,
        kind,
        name: name.to_string(),
        team: team.to_string(),
        environment: environment.to_string(),
        image: format!("{}/{team}/{name}:1", crate::CANONICAL_REGISTRY),
        access_policy: AccessPolicy::default(),
        resources: Resources::default(),
        deploy_info: DeployInfo {
            commit_sha: Some("abc123".to_string()),
            ..DeployInfo::default()
        },
        authz: vec![],
        ingresses: vec![],
        variables: vec![],
        secret_names: vec![],
        schedule: None,
        integrations: Integrations::default(),
        status: Status::default(),
    }
}
