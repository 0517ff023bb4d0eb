use super::decode;
use chrono::{DateTime, Utc};
use workload_api_core::{
    access_policy::{External, Rule},
    status::{SyncCondition, SyncReason},
    workload::{
        Authz, DeployInfo, Integrations, JobSchedule, KafkaRef, ResourceAmounts, Resources,
        Scaling, ScalingStrategy, ServiceRef, SqlInstanceRef, Variable,
    },
    AccessPolicy, ConversionError, Ident, Status, Workload, WorkloadKind,
};
use workload_api_k8s_api::{
    annotations,
    nais::{self, ApplicationSpec, NaisjobSpec, WorkloadStatus},
    DynamicObject, ResourceExt,
};

/// A decoded workload and the sync condition its status is synthesized from.
#[derive(Clone, Debug)]
pub struct Mapped {
    pub workload: Workload,
    pub condition: Option<SyncCondition>,
}

/// Decodes an `Application` observed in `environment`.
///
/// The returned workload's rules are unresolved and its status is the default.
pub fn to_app(obj: &DynamicObject, environment: &str) -> Result<Mapped, ConversionError> {
    let spec: ApplicationSpec = decode(obj, "spec", "application spec")?;
    let status: WorkloadStatus = decode(obj, "status", "application status")?;

    let name = obj.name_any();
    let team = obj.namespace().unwrap_or_default();

    let timestamp = match status.synchronization_state.as_deref() {
        Some("RolloutComplete") => from_nanos(status.rollout_complete_time),
        Some("Synchronized") => from_nanos(status.synchronization_time),
        _ => None,
    };

    let mut authz = Vec::new();
    if let Some(azure) = &spec.azure {
        let application = is_enabled(&azure.application);
        let sidecar = is_enabled(&azure.sidecar);
        if application || sidecar {
            authz.push(Authz::AzureAd {
                application,
                sidecar,
            });
        }
    }
    if spec.idporten.as_ref().is_some_and(|i| i.enabled) {
        authz.push(Authz::IdPorten);
    }
    if let Some(maskinporten) = maskinporten(&spec.maskinporten) {
        authz.push(maskinporten);
    }
    if spec.tokenx.as_ref().is_some_and(|t| t.enabled) {
        authz.push(Authz::TokenX);
    }

    let workload = Workload {
        id: Ident::app(environment, &team, &name),
        kind: WorkloadKind::App,
        image: spec.image.clone(),
        access_policy: access_policy(spec.access_policy.as_ref()),
        resources: resources(spec.resources.as_ref(), spec.replicas.as_ref()),
        deploy_info: deploy_info(obj, timestamp),
        authz,
        ingresses: spec.ingresses.clone(),
        variables: variables(&spec.env),
        secret_names: secret_names(&spec.files_from, &spec.env_from),
        schedule: None,
        integrations: integrations(
            spec.gcp.as_ref(),
            spec.kafka.as_ref(),
            spec.open_search.as_ref(),
            &spec.valkey,
        ),
        status: Status::default(),
        environment: environment.to_string(),
        name,
        team,
    };

    Ok(Mapped {
        workload,
        condition: sync_condition(&status),
    })
}

/// Decodes a `Naisjob` observed in `environment`.
///
/// The returned workload's rules are unresolved and its status is the default.
pub fn to_job(obj: &DynamicObject, environment: &str) -> Result<Mapped, ConversionError> {
    let spec: NaisjobSpec = decode(obj, "spec", "naisjob spec")?;
    let status: WorkloadStatus = decode(obj, "status", "naisjob status")?;

    let name = obj.name_any();
    let team = obj.namespace().unwrap_or_default();

    let mut authz = Vec::new();
    if spec
        .azure
        .as_ref()
        .is_some_and(|a| is_enabled(&a.application))
    {
        authz.push(Authz::AzureAd {
            application: true,
            sidecar: false,
        });
    }
    if let Some(maskinporten) = maskinporten(&spec.maskinporten) {
        authz.push(maskinporten);
    }

    let workload = Workload {
        id: Ident::job(environment, &team, &name),
        kind: WorkloadKind::Job,
        image: spec.image.clone(),
        access_policy: access_policy(spec.access_policy.as_ref()),
        resources: resources(spec.resources.as_ref(), None),
        deploy_info: deploy_info(obj, from_nanos(status.rollout_complete_time)),
        authz,
        ingresses: vec![],
        variables: variables(&spec.env),
        secret_names: secret_names(&spec.files_from, &spec.env_from),
        schedule: Some(JobSchedule {
            schedule: spec.schedule.clone().filter(|s| !s.is_empty()),
            completions: spec.completions,
            parallelism: spec.parallelism,
            retries: spec.backoff_limit.unwrap_or_default(),
        }),
        integrations: integrations(
            spec.gcp.as_ref(),
            spec.kafka.as_ref(),
            spec.open_search.as_ref(),
            &spec.valkey,
        ),
        status: Status::default(),
        environment: environment.to_string(),
        name,
        team,
    };

    Ok(Mapped {
        workload,
        condition: sync_condition(&status),
    })
}

fn sync_condition(status: &WorkloadStatus) -> Option<SyncCondition> {
    status
        .synchronization_condition()
        .map(|c| SyncCondition {
            reason: SyncReason::from(c.reason.as_str()),
            message: c.message.clone(),
        })
}

fn from_nanos(nanos: i64) -> Option<DateTime<Utc>> {
    (nanos > 0).then(|| DateTime::from_timestamp_nanos(nanos))
}

fn deploy_info(obj: &DynamicObject, timestamp: Option<DateTime<Utc>>) -> DeployInfo {
    let annotation = |key: &str| {
        obj.annotations()
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    };
    DeployInfo {
        deployer: annotation(annotations::DEPLOY_ACTOR),
        commit_sha: annotation(annotations::DEPLOY_COMMIT_SHA),
        url: annotation(annotations::DEPLOY_WORKFLOW_URL),
        timestamp,
    }
}

fn access_policy(policy: Option<&nais::AccessPolicy>) -> AccessPolicy {
    let Some(policy) = policy else {
        return AccessPolicy::default();
    };

    let inbound = policy
        .inbound
        .iter()
        .flat_map(|i| i.rules.iter())
        .map(rule)
        .collect();
    let outbound = policy
        .outbound
        .iter()
        .flat_map(|o| o.rules.iter())
        .map(rule)
        .collect();
    let external = policy
        .outbound
        .iter()
        .flat_map(|o| o.external.iter())
        .map(|e| External {
            host: e.host.clone().filter(|h| !h.is_empty()),
            ipv4: e.ipv4.clone().filter(|ip| !ip.is_empty()),
            ports: e.ports.iter().map(|p| p.port).collect(),
        })
        .collect();

    AccessPolicy {
        inbound,
        outbound,
        external,
    }
}

fn rule(rule: &nais::AccessRule) -> Rule {
    Rule {
        application: rule.application.clone(),
        namespace: rule.namespace.clone().filter(|n| !n.is_empty()),
        cluster: rule.cluster.clone().filter(|c| !c.is_empty()),
        ..Rule::default()
    }
}

fn resources(
    requirements: Option<&nais::ResourceRequirements>,
    replicas: Option<&nais::Replicas>,
) -> Resources {
    let amounts = |a: Option<&nais::ResourceAmounts>| ResourceAmounts {
        cpu: a.and_then(|a| a.cpu.clone()),
        memory: a.and_then(|a| a.memory.clone()),
    };

    let mut scaling = Scaling::default();
    if let Some(replicas) = replicas {
        scaling.min = replicas.min.unwrap_or_default();
        scaling.max = replicas.max.unwrap_or_default();

        let strategy = replicas.scaling_strategy.as_ref();
        if let Some(cpu) = strategy.and_then(|s| s.cpu.as_ref()) {
            if cpu.threshold_percentage > 0 {
                scaling.strategies.push(ScalingStrategy::Cpu {
                    threshold: cpu.threshold_percentage,
                });
            }
        }
        if let Some(kafka) = strategy.and_then(|s| s.kafka.as_ref()) {
            if kafka.threshold > 0 {
                scaling.strategies.push(ScalingStrategy::KafkaLag {
                    threshold: kafka.threshold,
                    consumer_group: kafka.consumer_group.clone(),
                    topic: kafka.topic.clone(),
                });
            }
        }
    }

    Resources {
        limits: amounts(requirements.and_then(|r| r.limits.as_ref())),
        requests: amounts(requirements.and_then(|r| r.requests.as_ref())),
        scaling,
    }
}

fn is_enabled(toggle: &Option<nais::Toggle>) -> bool {
    toggle.as_ref().is_some_and(|t| t.enabled)
}

fn maskinporten(maskinporten: &Option<nais::Maskinporten>) -> Option<Authz> {
    let maskinporten = maskinporten.as_ref().filter(|m| m.enabled)?;
    let names = |scopes: &[nais::NamedScope]| -> Vec<String> {
        scopes.iter().map(|s| s.name.clone()).collect()
    };
    let scopes = maskinporten.scopes.as_ref();
    Some(Authz::Maskinporten {
        consumes: scopes.map(|s| names(&s.consumes)).unwrap_or_default(),
        exposes: scopes.map(|s| names(&s.exposes)).unwrap_or_default(),
    })
}

fn variables(env: &[nais::EnvVar]) -> Vec<Variable> {
    env.iter()
        .map(|v| Variable {
            name: v.name.clone(),
            value: v.value.clone(),
        })
        .collect()
}

fn secret_names(files_from: &[nais::FilesFrom], env_from: &[nais::EnvFrom]) -> Vec<String> {
    let mut secrets = files_from
        .iter()
        .filter_map(|f| f.secret.clone())
        .chain(env_from.iter().filter_map(|e| e.secret.clone()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    secrets.sort();
    secrets.dedup();
    secrets
}

fn integrations(
    gcp: Option<&nais::Gcp>,
    kafka: Option<&nais::Kafka>,
    opensearch: Option<&nais::ServiceAccess>,
    valkey: &[nais::ServiceAccess],
) -> Integrations {
    let service = |s: &nais::ServiceAccess| ServiceRef {
        instance: s.instance.clone(),
        access: s.access.clone(),
    };
    Integrations {
        sql_instances: gcp
            .iter()
            .flat_map(|g| g.sql_instances.iter())
            .map(|i| SqlInstanceRef {
                name: i.name.clone().filter(|n| !n.is_empty()),
                kind: i.type_.clone(),
                tier: i.tier.clone(),
            })
            .collect(),
        opensearch: opensearch.map(service),
        valkey: valkey.iter().map(service).collect(),
        kafka: kafka.map(|k| KafkaRef {
            pool: k.pool.clone(),
            streams: k.streams,
        }),
    }
}
