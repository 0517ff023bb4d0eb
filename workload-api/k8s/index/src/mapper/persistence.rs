use super::decode;
use workload_api_core::{
    persistence::{
        BigQueryAccess, BigQueryDataset, Bucket, KafkaTopic, SqlInstance, TopicAcl, Valkey,
    },
    workload::SqlInstanceRef,
    ConversionError, Ident, Workload,
};
use workload_api_k8s_api::{
    annotations,
    persistence::{
        AivenServiceSpec, BigQueryDatasetSpec, SqlDatabaseSpec, SqlInstanceSpec,
        StorageBucketSpec, TopicSpec,
    },
    DynamicObject, ResourceExt,
};

#[derive(Debug, thiserror::Error)]
#[error("missing {0} annotation")]
struct MissingAnnotation(&'static str);

pub fn to_bucket(obj: &DynamicObject, environment: &str) -> Result<Bucket, ConversionError> {
    let spec: StorageBucketSpec = decode(obj, "spec", "bucket spec")?;
    let meta = obj.annotations();
    let project_id = meta
        .get(annotations::GCP_PROJECT_ID)
        .filter(|p| !p.is_empty())
        .cloned()
        .ok_or_else(|| {
            ConversionError::new("bucket", MissingAnnotation(annotations::GCP_PROJECT_ID))
        })?;

    let name = obj.name_any();
    let team = obj.namespace().unwrap_or_default();
    Ok(Bucket {
        id: Ident::persistence("bucket", environment, &team, &name),
        project_id,
        cascading_delete: meta
            .get(annotations::GCP_DELETION_POLICY)
            .is_some_and(|p| p == "abandon"),
        location: spec.location,
        public_access_prevention: spec.public_access_prevention,
        uniform_bucket_level_access: spec.uniform_bucket_level_access.unwrap_or_default(),
        environment: environment.to_string(),
        name,
        team,
    })
}

pub fn to_bigquery_dataset(
    obj: &DynamicObject,
    environment: &str,
) -> Result<BigQueryDataset, ConversionError> {
    let spec: BigQueryDatasetSpec = decode(obj, "spec", "bigquery dataset spec")?;
    let name = if spec.name.is_empty() {
        obj.name_any()
    } else {
        spec.name.clone()
    };
    let team = obj.namespace().unwrap_or_default();
    Ok(BigQueryDataset {
        id: Ident::persistence("bigquery", environment, &team, &name),
        description: spec.description,
        location: spec.location,
        cascading_delete: spec.cascading_delete,
        access: spec
            .access
            .into_iter()
            .map(|a| BigQueryAccess {
                role: a.role,
                email: a.email,
            })
            .collect(),
        environment: environment.to_string(),
        name,
        team,
    })
}

/// Maps a Valkey instance. Instances are named `valkey-<team>-<instance>` by the platform.
pub fn to_valkey(
    obj: &DynamicObject,
    environment: &str,
    access: impl Fn(&str) -> Option<String>,
) -> Result<Valkey, ConversionError> {
    let spec: AivenServiceSpec = decode(obj, "spec", "valkey spec")?;
    let team = obj.namespace().unwrap_or_default();
    let full_name = obj.name_any();
    let name = full_name
        .strip_prefix(&format!("valkey-{team}-"))
        .unwrap_or(&full_name)
        .to_string();
    Ok(Valkey {
        id: Ident::persistence("valkey", environment, &team, &name),
        plan: spec.plan,
        access: access(&name),
        environment: environment.to_string(),
        name,
        team,
    })
}

pub fn to_kafka_topic(obj: &DynamicObject, environment: &str) -> Result<KafkaTopic, ConversionError> {
    let spec: TopicSpec = decode(obj, "spec", "kafka topic spec")?;
    let name = obj.name_any();
    let team = obj.namespace().unwrap_or_default();
    Ok(KafkaTopic {
        id: Ident::persistence("kafkaTopic", environment, &team, &name),
        pool: spec.pool,
        acl: spec
            .acl
            .into_iter()
            .map(|a| TopicAcl {
                team: a.team,
                application: a.application,
                access: a.access,
            })
            .collect(),
        environment: environment.to_string(),
        name,
        team,
    })
}

/// Maps a SQL instance declared by `workload`, enriched from the cluster's instance resource
/// when one exists.
pub fn to_sql_instance(
    workload: &Workload,
    declared: &SqlInstanceRef,
    instance: Option<&DynamicObject>,
    databases: Vec<String>,
) -> Result<SqlInstance, ConversionError> {
    let spec: SqlInstanceSpec = match instance {
        Some(obj) => decode(obj, "spec", "sql instance spec")?,
        None => SqlInstanceSpec::default(),
    };
    let name = declared
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| workload.name.clone());
    let tier = spec
        .settings
        .and_then(|s| s.tier)
        .or_else(|| declared.tier.clone());

    Ok(SqlInstance {
        id: Ident::persistence("sqlInstance", &workload.environment, &workload.team, &name),
        environment: workload.environment.clone(),
        team: workload.team.clone(),
        kind: declared.kind.clone(),
        database_version: spec.database_version,
        region: spec.region,
        tier,
        databases,
        name,
    })
}

/// The name of the SQL instance a database belongs to, if it references one.
pub fn sql_database_instance(obj: &DynamicObject) -> Result<Option<String>, ConversionError> {
    let spec: SqlDatabaseSpec = decode(obj, "spec", "sql database spec")?;
    Ok(spec.instance_ref.map(|r| r.name).filter(|n| !n.is_empty()))
}
