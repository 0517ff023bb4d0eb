//! Payloads of the `nais.io` workload resources, decoded from untyped objects.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub image: String,
    pub access_policy: Option<AccessPolicy>,
    pub replicas: Option<Replicas>,
    pub resources: Option<ResourceRequirements>,
    pub azure: Option<Azure>,
    pub idporten: Option<IdPorten>,
    pub maskinporten: Option<Maskinporten>,
    pub tokenx: Option<Toggle>,
    pub ingresses: Vec<String>,
    pub env: Vec<EnvVar>,
    pub env_from: Vec<EnvFrom>,
    pub files_from: Vec<FilesFrom>,
    pub gcp: Option<Gcp>,
    pub kafka: Option<Kafka>,
    pub open_search: Option<ServiceAccess>,
    pub valkey: Vec<ServiceAccess>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NaisjobSpec {
    pub image: String,
    pub access_policy: Option<AccessPolicy>,
    pub resources: Option<ResourceRequirements>,
    pub azure: Option<Azure>,
    pub maskinporten: Option<Maskinporten>,
    pub env: Vec<EnvVar>,
    pub env_from: Vec<EnvFrom>,
    pub files_from: Vec<FilesFrom>,
    pub gcp: Option<Gcp>,
    pub kafka: Option<Kafka>,
    pub open_search: Option<ServiceAccess>,
    pub valkey: Vec<ServiceAccess>,
    pub schedule: Option<String>,
    pub completions: Option<i32>,
    pub parallelism: Option<i32>,
    pub backoff_limit: Option<i32>,
}

/// Status shared by applications and naisjobs.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkloadStatus {
    pub conditions: Vec<Condition>,
    pub rollout_complete_time: i64,
    pub synchronization_time: i64,
    pub synchronization_state: Option<String>,
}

/// A loosely-typed status condition. Fields the API server may omit are optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: String,
    pub reason: String,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    pub inbound: Option<Inbound>,
    pub outbound: Option<Outbound>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Inbound {
    pub rules: Vec<AccessRule>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Outbound {
    pub rules: Vec<AccessRule>,
    pub external: Vec<ExternalRule>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccessRule {
    pub application: String,
    pub namespace: Option<String>,
    pub cluster: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExternalRule {
    pub host: Option<String>,
    pub ipv4: Option<String>,
    pub ports: Vec<Port>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Port {
    pub port: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Replicas {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub scaling_strategy: Option<ScalingStrategy>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScalingStrategy {
    pub cpu: Option<CpuScaling>,
    pub kafka: Option<KafkaScaling>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuScaling {
    pub threshold_percentage: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KafkaScaling {
    pub topic: String,
    pub consumer_group: String,
    pub threshold: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceRequirements {
    pub limits: Option<ResourceAmounts>,
    pub requests: Option<ResourceAmounts>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceAmounts {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Azure {
    pub application: Option<Toggle>,
    pub sidecar: Option<Toggle>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdPorten {
    pub enabled: bool,
    pub sidecar: Option<Toggle>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Maskinporten {
    pub enabled: bool,
    pub scopes: Option<MaskinportenScopes>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaskinportenScopes {
    pub consumes: Vec<NamedScope>,
    pub exposes: Vec<NamedScope>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamedScope {
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnvFrom {
    pub secret: Option<String>,
    pub configmap: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilesFrom {
    pub secret: Option<String>,
    pub configmap: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Gcp {
    pub sql_instances: Vec<SqlInstance>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SqlInstance {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub tier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Kafka {
    pub pool: String,
    pub streams: bool,
}

/// A reference to an Aiven-managed service instance.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceAccess {
    pub instance: String,
    pub access: Option<String>,
}

// === impl WorkloadStatus ===

impl WorkloadStatus {
    pub const SYNCHRONIZATION_STATE: &'static str = "SynchronizationState";

    pub fn synchronization_condition(&self) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.type_ == Self::SYNCHRONIZATION_STATE)
    }
}
