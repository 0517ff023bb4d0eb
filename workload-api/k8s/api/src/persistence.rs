//! Payloads of the storage, queue and search resources related to workloads.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TopicSpec {
    pub pool: String,
    pub acl: Vec<TopicAcl>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TopicAcl {
    pub team: String,
    pub application: String,
    pub access: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageBucketSpec {
    pub location: Option<String>,
    pub public_access_prevention: Option<String>,
    pub uniform_bucket_level_access: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BigQueryDatasetSpec {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cascading_delete: bool,
    pub access: Vec<BigQueryAccess>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BigQueryAccess {
    pub role: String,
    pub email: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqlInstanceSpec {
    pub database_version: Option<String>,
    pub region: Option<String>,
    pub settings: Option<SqlInstanceSettings>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SqlInstanceSettings {
    pub tier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SqlDatabaseSpec {
    pub instance_ref: Option<ResourceRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResourceRef {
    pub name: String,
}

/// Spec shared by the Aiven-managed kinds (OpenSearch and Valkey).
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AivenServiceSpec {
    pub plan: Option<String>,
    pub project: Option<String>,
}
