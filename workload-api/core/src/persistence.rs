use crate::Ident;
use serde::Serialize;

/// A storage, queue or search resource related to a workload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Persistence {
    Bucket(Bucket),
    BigQueryDataset(BigQueryDataset),
    Valkey(Valkey),
    SqlInstance(SqlInstance),
    OpenSearch(OpenSearch),
    Kafka(Kafka),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub id: Ident,
    pub name: String,
    pub environment: String,
    pub team: String,
    pub project_id: String,
    pub cascading_delete: bool,
    pub location: Option<String>,
    pub public_access_prevention: Option<String>,
    pub uniform_bucket_level_access: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BigQueryDataset {
    pub id: Ident,
    pub name: String,
    pub environment: String,
    pub team: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub cascading_delete: bool,
    pub access: Vec<BigQueryAccess>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BigQueryAccess {
    pub role: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Valkey {
    pub id: Ident,
    pub name: String,
    pub environment: String,
    pub team: String,
    pub plan: Option<String>,
    /// The access level granted by the workload's own spec, if it declares the instance.
    pub access: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SqlInstance {
    pub id: Ident,
    pub name: String,
    pub environment: String,
    pub team: String,
    pub kind: Option<String>,
    pub tier: Option<String>,
    pub database_version: Option<String>,
    pub region: Option<String>,
    pub databases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OpenSearch {
    pub name: String,
    pub access: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Kafka {
    pub pool: String,
    pub streams: bool,
    pub topics: Vec<KafkaTopic>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KafkaTopic {
    pub id: Ident,
    pub name: String,
    pub environment: String,
    pub team: String,
    pub pool: String,
    pub acl: Vec<TopicAcl>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TopicAcl {
    pub team: String,
    pub application: String,
    pub access: String,
}

// === impl KafkaTopic ===

impl KafkaTopic {
    /// Whether the topic grants any access to `application` owned by `team`.
    pub fn grants(&self, team: &str, application: &str) -> bool {
        self.acl
            .iter()
            .any(|acl| acl.team == team && acl.application == application)
    }
}
