use crate::{mapper, Cluster, Environments, Error};
use workload_api_core::{
    persistence::{Kafka, KafkaTopic, OpenSearch},
    Persistence, Workload,
};
use workload_api_k8s_api::{Kind, ResourceExt, Selector};

impl Environments {
    /// Returns the storage, queue and search resources related to `workload`.
    ///
    /// Buckets, datasets and Valkey instances are listed from the team's namespace when the
    /// cluster serves them. SQL instances, OpenSearch and Kafka come from the workload's own spec;
    /// a Kafka pool lists the topics whose ACL grants the workload.
    pub fn persistence(&self, workload: &Workload) -> Result<Vec<Persistence>, Error> {
        let environment = workload.environment.as_str();
        let team = workload.team.as_str();
        let cluster = self.cluster(environment)?;
        let mut related = Vec::new();

        if let Some(buckets) = cluster.optional(Kind::StorageBucket) {
            for obj in buckets.list(team, &Selector::default()) {
                let bucket = mapper::to_bucket(&obj, environment)
                    .map_err(Error::conversion(environment, team, &obj.name_any()))?;
                related.push(Persistence::Bucket(bucket));
            }
        }

        if let Some(datasets) = cluster.optional(Kind::BigQueryDataset) {
            for obj in datasets.list(team, &Selector::default()) {
                let dataset = mapper::to_bigquery_dataset(&obj, environment)
                    .map_err(Error::conversion(environment, team, &obj.name_any()))?;
                related.push(Persistence::BigQueryDataset(dataset));
            }
        }

        if let Some(instances) = cluster.optional(Kind::Valkey) {
            let access = |instance: &str| {
                workload
                    .integrations
                    .valkey
                    .iter()
                    .find(|v| v.instance == instance)
                    .and_then(|v| v.access.clone())
            };
            for obj in instances.list(team, &Selector::default()) {
                let valkey = mapper::to_valkey(&obj, environment, &access)
                    .map_err(Error::conversion(environment, team, &obj.name_any()))?;
                related.push(Persistence::Valkey(valkey));
            }
        }

        for declared in &workload.integrations.sql_instances {
            let name = declared
                .name
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(&workload.name);
            let instance = cluster
                .optional(Kind::SqlInstance)
                .and_then(|store| store.get(team, name));
            let databases = sql_databases(cluster, team, name)?;
            let sql = mapper::to_sql_instance(workload, declared, instance.as_deref(), databases)
                .map_err(Error::conversion(environment, team, name))?;
            related.push(Persistence::SqlInstance(sql));
        }

        if let Some(opensearch) = &workload.integrations.opensearch {
            related.push(Persistence::OpenSearch(OpenSearch {
                name: opensearch.instance.clone(),
                access: opensearch.access.clone(),
            }));
        }

        if let Some(kafka) = &workload.integrations.kafka {
            related.push(Persistence::Kafka(Kafka {
                pool: kafka.pool.clone(),
                streams: kafka.streams,
                topics: self.topics(workload)?,
            }));
        }

        Ok(related)
    }

    /// Topics granting access to `workload`.
    ///
    /// On-premises environments have their topics managed from the matching GCP environment.
    fn topics(&self, workload: &Workload) -> Result<Vec<KafkaTopic>, Error> {
        let environment = topic_environment(&workload.environment);
        let Some(topics) = self
            .cluster(environment)
            .ok()
            .and_then(|c| c.optional(Kind::Topic))
        else {
            return Ok(vec![]);
        };

        let mut granted = Vec::new();
        for obj in topics.list_all() {
            let team = obj.namespace().unwrap_or_default();
            let topic = mapper::to_kafka_topic(&obj, environment)
                .map_err(Error::conversion(environment, &team, &obj.name_any()))?;
            if topic.grants(&workload.team, &workload.name) {
                granted.push(topic);
            }
        }
        Ok(granted)
    }
}

fn topic_environment(environment: &str) -> &str {
    match environment {
        "dev-fss" => "dev-gcp",
        "prod-fss" => "prod-gcp",
        env => env,
    }
}

/// Names of the databases in `team`'s namespace that belong to `instance`.
fn sql_databases(cluster: &Cluster, team: &str, instance: &str) -> Result<Vec<String>, Error> {
    let Some(databases) = cluster.optional(Kind::SqlDatabase) else {
        return Ok(vec![]);
    };

    let mut names = Vec::new();
    for obj in databases.list(team, &Selector::default()) {
        let owner = mapper::sql_database_instance(&obj)
            .map_err(Error::conversion(cluster.name(), team, &obj.name_any()))?;
        if owner.as_deref() == Some(instance) {
            names.push(obj.name_any());
        }
    }
    Ok(names)
}
