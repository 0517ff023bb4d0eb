use crate::{Cluster, Environments, Error, StartError, Store};
use kube::Resource;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use serde_json::json;
use workload_api_core::{
    access_policy::MutualExplanation,
    persistence::Persistence,
    status::{ErrorLevel, State, StateErrorKind},
    TeamDirectory, UserTeam, WorkloadKind, CANONICAL_REGISTRY,
};
use workload_api_k8s_api::{DynamicObject, Event, Job, Kind, Pod, Selector};

fn init_tracing() -> tracing::subscriber::DefaultGuard {
    tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .finish(),
    )
}

/// Feeds `events` through the store's index loop until they are exhausted.
async fn feed<K>(store: &Store<K>, events: Vec<Event<K>>)
where
    K: Resource + std::fmt::Debug,
{
    kubert::index::namespaced(store.shared(), futures::stream::iter(events)).await;
}

/// Indexes `objs` as a complete listing.
async fn list<K>(store: &Store<K>, objs: Vec<K>)
where
    K: Resource + std::fmt::Debug,
{
    let mut events = vec![Event::Init];
    events.extend(objs.into_iter().map(Event::InitApply));
    events.push(Event::InitDone);
    feed(store, events).await;
}

fn object(namespace: &str, name: &str, data: serde_json::Value) -> DynamicObject {
    let mut value = json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "annotations": { "deploy.nais.io/github-sha": "abc123" },
        },
    });
    if let (Some(obj), serde_json::Value::Object(data)) = (value.as_object_mut(), data) {
        obj.extend(data);
    }
    serde_json::from_value(value).expect("object must deserialize")
}

fn image(team: &str, name: &str) -> String {
    format!("{CANONICAL_REGISTRY}/{team}/{name}:1")
}

fn app(team: &str, name: &str, access_policy: serde_json::Value) -> DynamicObject {
    object(
        team,
        name,
        json!({
            "spec": {
                "image": image(team, name),
                "accessPolicy": access_policy,
            },
            "status": {
                "synchronizationState": "RolloutComplete",
                "conditions": [{
                    "type": "SynchronizationState",
                    "reason": "RolloutComplete",
                    "message": "",
                }],
            },
        }),
    )
}

fn naisjob(team: &str, name: &str, access_policy: serde_json::Value) -> DynamicObject {
    object(
        team,
        name,
        json!({
            "spec": {
                "image": image(team, name),
                "schedule": "0 * * * *",
                "accessPolicy": access_policy,
            },
        }),
    )
}

fn pod(team: &str, name: &str, labels: serde_json::Value, running: bool) -> Pod {
    let app = labels["app"].as_str().unwrap_or_default().to_string();
    let state = if running {
        json!({ "running": {} })
    } else {
        json!({ "waiting": { "reason": "CrashLoopBackOff" } })
    };
    serde_json::from_value(json!({
        "metadata": { "name": name, "namespace": team, "uid": name, "labels": labels },
        "spec": { "containers": [{ "name": app, "image": "img:1" }] },
        "status": {
            "containerStatuses": [{
                "name": app,
                "image": "img:1",
                "imageID": "",
                "ready": running,
                "restartCount": 0,
                "state": state,
            }],
        },
    }))
    .expect("pod must deserialize")
}

fn run(team: &str, job: &str, name: &str, started: &str, failed: bool) -> Job {
    let status = if failed {
        json!({
            "startTime": started,
            "failed": 1,
            "conditions": [{ "type": "Failed", "status": "True" }],
        })
    } else {
        json!({ "startTime": started, "succeeded": 1, "completionTime": started })
    };
    serde_json::from_value(json!({
        "metadata": { "name": name, "namespace": team, "labels": { "app": job } },
        "spec": { "template": { "spec": { "containers": [{ "name": job }] } } },
        "status": status,
    }))
    .expect("job must deserialize")
}

fn clusters(names: &[&str]) -> Environments {
    Environments::new(names.iter().map(|n| Cluster::new(*n, true, Kind::OPTIONAL)))
}

struct Directory {
    teams: Vec<&'static str>,
}

#[async_trait::async_trait]
impl TeamDirectory for Directory {
    async fn team_exists(&self, team: &str) -> anyhow::Result<bool> {
        if team == "team-broken" {
            anyhow::bail!("directory unavailable");
        }
        Ok(self.teams.contains(&team))
    }

    async fn user_teams(&self, _: &str) -> anyhow::Result<Vec<UserTeam>> {
        Ok(vec![])
    }
}

#[tokio::test]
async fn relist_replaces_snapshot() {
    let _tracing = init_tracing();
    let store = Store::<DynamicObject>::default();
    assert!(!store.is_synced());

    feed(
        &store,
        vec![
            Event::Init,
            Event::InitApply(app("team-a", "a", json!({}))),
            Event::InitApply(app("team-a", "b", json!({}))),
            Event::InitDone,
            Event::Apply(app("team-b", "c", json!({}))),
            Event::Delete(app("team-a", "a", json!({}))),
        ],
    )
    .await;
    assert!(store.is_synced());
    assert_eq!(store.len(), 2);
    assert!(store.get("team-a", "a").is_none());
    assert!(store.get("team-b", "c").is_some());

    feed(
        &store,
        vec![
            Event::Init,
            Event::InitApply(app("team-c", "d", json!({}))),
        ],
    )
    .await;
    assert_eq!(store.len(), 2, "a partial relist must not be visible");

    list(&store, vec![app("team-c", "d", json!({}))]).await;
    assert_eq!(store.len(), 1);
    assert!(store.get("team-c", "d").is_some());
    assert!(store.is_synced());
}

#[tokio::test]
async fn optional_caches_skip_platform_namespace() {
    let cluster = Cluster::new("dev", true, [Kind::Valkey]);
    let valkeys = cluster.optional(Kind::Valkey).expect("valkey is served");
    list(
        valkeys,
        vec![
            object("nais-system", "valkey-nais-system-x", json!({})),
            object("team-a", "valkey-team-a-x", json!({})),
        ],
    )
    .await;
    assert_eq!(valkeys.len(), 1);
    assert!(valkeys.get("team-a", "valkey-team-a-x").is_some());
}

#[test]
fn gcp_only_capabilities() {
    let onprem = Cluster::new("dev-fss", false, Kind::OPTIONAL);
    assert!(onprem.has_capability(Kind::Topic));
    assert!(!onprem.has_capability(Kind::StorageBucket));
    assert!(!onprem.has_capability(Kind::SqlInstance));

    let gcp = Cluster::new("dev-gcp", true, [Kind::Topic, Kind::Pod]);
    assert!(gcp.has_capability(Kind::Topic));
    assert!(!gcp.has_capability(Kind::Pod));
    assert!(!gcp.has_capability(Kind::Valkey));
}

#[tokio::test]
async fn reciprocal_apps_are_nais() {
    let envs = clusters(&["dev"]);
    let dev = envs.cluster("dev").expect("dev exists");
    list(
        dev.apps(),
        vec![
            app(
                "team-a",
                "frontend",
                json!({ "outbound": { "rules": [{ "application": "backend" }] } }),
            ),
            app(
                "team-a",
                "backend",
                json!({ "inbound": { "rules": [{ "application": "frontend" }] } }),
            ),
        ],
    )
    .await;
    list(
        dev.pods(),
        vec![pod("team-a", "backend-1", json!({ "app": "backend" }), true)],
    )
    .await;

    let frontend = envs
        .app("frontend", "team-a", "dev")
        .expect("lookup must succeed")
        .expect("frontend exists");
    assert!(frontend.access_policy.outbound[0].mutual);
    assert_eq!(frontend.status.state, State::Nais);
    assert!(frontend.status.errors.is_empty());

    let backend = envs
        .app("backend", "team-a", "dev")
        .expect("lookup must succeed")
        .expect("backend exists");
    assert!(backend.access_policy.inbound[0].mutual);
    assert_eq!(backend.status.state, State::Nais);

    let instances = envs
        .instances("team-a", "dev", "backend")
        .expect("instances must list");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].name, "backend-1");
}

#[tokio::test]
async fn missing_peer_is_reported() {
    let envs = clusters(&["dev"]);
    let dev = envs.cluster("dev").expect("dev exists");
    list(
        dev.apps(),
        vec![app(
            "team-a",
            "frontend",
            json!({ "outbound": { "rules": [{ "application": "ghost" }] } }),
        )],
    )
    .await;

    let frontend = envs
        .app("frontend", "team-a", "dev")
        .expect("lookup must succeed")
        .expect("frontend exists");
    let rule = &frontend.access_policy.outbound[0];
    assert!(!rule.mutual);
    assert_eq!(rule.mutual_explanation, Some(MutualExplanation::AppNotFound));

    assert_eq!(frontend.status.state, State::NotNais);
    assert_eq!(frontend.status.errors.len(), 1);
    assert_eq!(frontend.status.errors[0].level, ErrorLevel::Warning);
    assert!(matches!(
        &frontend.status.errors[0].kind,
        StateErrorKind::OutboundAccess { rule } if rule.application == "ghost"
    ));
}

#[tokio::test]
async fn cross_cluster_job_peer() {
    let envs = clusters(&["dev", "prod"]);
    list(
        envs.cluster("dev").expect("dev exists").apps(),
        vec![app(
            "team-a",
            "api",
            json!({ "inbound": { "rules": [
                { "application": "nightly", "namespace": "team-b", "cluster": "prod" },
            ] } }),
        )],
    )
    .await;
    list(
        envs.cluster("prod").expect("prod exists").naisjobs(),
        vec![naisjob(
            "team-b",
            "nightly",
            json!({ "outbound": { "rules": [
                { "application": "api", "namespace": "team-a", "cluster": "dev" },
            ] } }),
        )],
    )
    .await;

    let api = envs
        .app("api", "team-a", "dev")
        .expect("lookup must succeed")
        .expect("api exists");
    let rule = &api.access_policy.inbound[0];
    assert!(rule.mutual);
    assert!(rule.is_job);

    let nightly = envs
        .job("nightly", "team-b", "prod")
        .expect("lookup must succeed")
        .expect("nightly exists");
    assert!(nightly.access_policy.outbound[0].mutual);
    assert!(!nightly.access_policy.outbound[0].is_job);
}

#[tokio::test]
async fn unknown_environments() {
    let envs = clusters(&["dev"]);
    assert!(matches!(
        envs.app("frontend", "team-a", "staging"),
        Err(Error::UnknownEnvironment(env)) if env == "staging"
    ));
    assert!(matches!(
        envs.runs("team-a", "staging", "nightly"),
        Err(Error::UnknownEnvironment(_))
    ));
    assert!(!envs.app_exists("staging", "team-a", "frontend"));
    assert!(!envs.job_exists("staging", "team-a", "nightly"));
    assert!(envs
        .app("frontend", "team-a", "dev")
        .expect("lookup must succeed")
        .is_none());
}

#[tokio::test]
async fn apps_are_ordered_across_environments() {
    let envs = clusters(&["dev", "prod"]);
    for env in ["dev", "prod"] {
        list(
            envs.cluster(env).expect("cluster exists").apps(),
            vec![app("team-a", "b", json!({})), app("team-a", "a", json!({}))],
        )
        .await;
    }

    let all = envs.apps("team-a", &[]).expect("apps must list");
    let ids = all.iter().map(|a| a.id.as_str()).collect::<Vec<_>>();
    assert_eq!(
        ids,
        [
            "app_dev_team-a_a",
            "app_prod_team-a_a",
            "app_dev_team-a_b",
            "app_prod_team-a_b"
        ]
    );

    let prod = envs
        .apps("team-a", &["prod".to_string()])
        .expect("apps must list");
    assert_eq!(prod.len(), 2);
    assert!(prod.iter().all(|a| a.environment == "prod"));
    assert!(envs.app_exists("prod", "team-a", "a"));
    assert!(!envs.app_exists("prod", "team-b", "a"));
}

#[tokio::test]
async fn job_runs_and_status() {
    let envs = clusters(&["dev"]);
    let dev = envs.cluster("dev").expect("dev exists");
    list(dev.naisjobs(), vec![naisjob("team-a", "nightly", json!({}))]).await;
    list(
        dev.jobs(),
        vec![
            run("team-a", "nightly", "nightly-1", "2024-01-01T00:00:00Z", false),
            run("team-a", "nightly", "nightly-2", "2024-01-02T00:00:00Z", true),
            run("team-a", "other", "other-1", "2024-01-03T00:00:00Z", true),
        ],
    )
    .await;
    list(
        dev.pods(),
        vec![
            pod(
                "team-a",
                "nightly-2-abc",
                json!({ "app": "nightly", "job-name": "nightly-2" }),
                false,
            ),
            pod(
                "team-a",
                "nightly-1-abc",
                json!({ "app": "nightly", "job-name": "nightly-1" }),
                false,
            ),
        ],
    )
    .await;

    let runs = envs
        .runs("team-a", "dev", "nightly")
        .expect("runs must list");
    let names = runs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["nightly-2", "nightly-1"]);
    assert_eq!(runs[0].pod_names, vec!["nightly-2-abc"]);
    assert!(runs[0].failed);

    let job = envs
        .job("nightly", "team-a", "dev")
        .expect("lookup must succeed")
        .expect("nightly exists");
    assert_eq!(job.status.state, State::Failing);
    assert_eq!(job.status.errors.len(), 1);
    assert_eq!(
        job.status.errors[0].kind,
        StateErrorKind::FailedRun {
            run_name: "nightly-2".to_string(),
            run_message: "Run failed after 1 attempts".to_string(),
        }
    );
    assert!(envs.job_exists("dev", "team-a", "nightly"));
}

#[tokio::test]
async fn renders_manifest() {
    let envs = clusters(&["dev"]);
    let dev = envs.cluster("dev").expect("dev exists");
    list(dev.apps(), vec![app("team-a", "frontend", json!({}))]).await;

    let manifest = envs
        .manifest("frontend", "team-a", "dev", WorkloadKind::App)
        .expect("manifest must render")
        .expect("frontend exists");
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(&manifest).expect("manifest must be YAML");
    assert_eq!(parsed["apiVersion"].as_str(), Some("nais.io/v1alpha1"));
    assert_eq!(parsed["kind"].as_str(), Some("Application"));
    assert_eq!(parsed["metadata"]["namespace"].as_str(), Some("team-a"));
    assert!(parsed.get("status").is_none());
    assert_eq!(
        parsed["spec"]["image"].as_str(),
        Some(image("team-a", "frontend").as_str())
    );

    assert!(envs
        .manifest("frontend", "team-a", "dev", WorkloadKind::Job)
        .expect("lookup must succeed")
        .is_none());
}

#[tokio::test]
async fn related_persistence() {
    let envs = Environments::new([
        Cluster::new("dev-gcp", true, Kind::OPTIONAL),
        Cluster::new("dev-fss", false, Kind::OPTIONAL),
    ]);
    let gcp = envs.cluster("dev-gcp").expect("dev-gcp exists");
    let fss = envs.cluster("dev-fss").expect("dev-fss exists");

    let mut frontend = app("team-a", "frontend", json!({}));
    frontend.data["spec"]["kafka"] = json!({ "pool": "nav-dev" });
    frontend.data["spec"]["valkey"] = json!([{ "instance": "sessions", "access": "read" }]);
    frontend.data["spec"]["openSearch"] = json!({ "instance": "logs", "access": "admin" });
    list(fss.apps(), vec![frontend]).await;
    list(
        fss.optional(Kind::Valkey).expect("valkey is served"),
        vec![
            object("team-a", "valkey-team-a-sessions", json!({ "spec": { "plan": "startup-4" } })),
            object("team-b", "valkey-team-b-other", json!({})),
        ],
    )
    .await;
    list(
        gcp.optional(Kind::Topic).expect("topics are served"),
        vec![
            object(
                "team-b",
                "events",
                json!({ "spec": { "pool": "nav-dev", "acl": [
                    { "team": "team-a", "application": "frontend", "access": "read" },
                ] } }),
            ),
            object(
                "team-b",
                "private",
                json!({ "spec": { "pool": "nav-dev", "acl": [
                    { "team": "team-b", "application": "frontend", "access": "read" },
                ] } }),
            ),
        ],
    )
    .await;

    let workload = envs
        .app("frontend", "team-a", "dev-fss")
        .expect("lookup must succeed")
        .expect("frontend exists");
    let related = envs.persistence(&workload).expect("persistence must list");
    assert_eq!(related.len(), 3);

    let Persistence::Valkey(valkey) = &related[0] else {
        panic!("expected valkey, got {:?}", related[0]);
    };
    assert_eq!(valkey.name, "sessions");
    assert_eq!(valkey.access.as_deref(), Some("read"));

    let Persistence::OpenSearch(opensearch) = &related[1] else {
        panic!("expected opensearch, got {:?}", related[1]);
    };
    assert_eq!(opensearch.name, "logs");

    let Persistence::Kafka(kafka) = &related[2] else {
        panic!("expected kafka, got {:?}", related[2]);
    };
    assert_eq!(kafka.pool, "nav-dev");
    let topics = kafka.topics.iter().map(|t| t.name.as_str()).collect::<Vec<_>>();
    assert_eq!(topics, ["events"]);
    assert_eq!(kafka.topics[0].environment, "dev-gcp");
}

#[tokio::test]
async fn sql_instances_from_gcp_caches() {
    let envs = clusters(&["dev-gcp"]);
    let gcp = envs.cluster("dev-gcp").expect("dev-gcp exists");

    let mut frontend = app("team-a", "frontend", json!({}));
    frontend.data["spec"]["gcp"] = json!({ "sqlInstances": [{ "type": "POSTGRES_15" }] });
    list(gcp.apps(), vec![frontend]).await;
    list(
        gcp.optional(Kind::SqlInstance).expect("sql instances are served"),
        vec![object(
            "team-a",
            "frontend",
            json!({ "spec": { "region": "europe-north1", "settings": { "tier": "db-g1-small" } } }),
        )],
    )
    .await;
    list(
        gcp.optional(Kind::SqlDatabase).expect("sql databases are served"),
        vec![
            object("team-a", "app", json!({ "spec": { "instanceRef": { "name": "frontend" } } })),
            object("team-a", "other", json!({ "spec": { "instanceRef": { "name": "other" } } })),
        ],
    )
    .await;

    let workload = envs
        .app("frontend", "team-a", "dev-gcp")
        .expect("lookup must succeed")
        .expect("frontend exists");
    let related = envs.persistence(&workload).expect("persistence must list");
    let [Persistence::SqlInstance(sql)] = related.as_slice() else {
        panic!("expected one sql instance, got {related:?}");
    };
    assert_eq!(sql.name, "frontend");
    assert_eq!(sql.kind.as_deref(), Some("POSTGRES_15"));
    assert_eq!(sql.tier.as_deref(), Some("db-g1-small"));
    assert_eq!(sql.databases, vec!["app"]);
}

#[tokio::test]
async fn search_ranks_visible_workloads() {
    let envs = clusters(&["dev", "prod"]);
    let dev = envs.cluster("dev").expect("dev exists");
    let prod = envs.cluster("prod").expect("prod exists");
    list(
        dev.apps(),
        vec![
            app("team-a", "frontend-admin", json!({})),
            app("team-a", "frontend", json!({})),
            app("team-a", "backend", json!({})),
            app("team-gone", "frontend", json!({})),
            app("team-broken", "frontend", json!({})),
        ],
    )
    .await;
    list(prod.apps(), vec![app("team-a", "frontend", json!({}))]).await;
    list(prod.naisjobs(), vec![naisjob("team-a", "frontend-cleanup", json!({}))]).await;
    list(dev.naisjobs(), vec![naisjob("team-a", "the-frontend-sync", json!({}))]).await;

    let directory = Directory {
        teams: vec!["team-a", "team-broken"],
    };

    let hits = envs
        .search("Frontend", None, &directory)
        .await
        .expect("search must succeed");
    let found = hits
        .iter()
        .map(|h| (h.rank, h.workload.id.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        found,
        [
            (0, "app_dev_team-a_frontend"),
            (0, "app_prod_team-a_frontend"),
            (1, "app_dev_team-a_frontend-admin"),
            (1, "job_prod_team-a_frontend-cleanup"),
            (2, "job_dev_team-a_the-frontend-sync"),
        ]
    );

    let jobs = envs
        .search("frontend", Some(WorkloadKind::Job), &directory)
        .await
        .expect("search must succeed");
    assert!(jobs.iter().all(|h| h.workload.kind == WorkloadKind::Job));
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn wait_synced_completes_once_apps_are_listed() {
    let envs = clusters(&["dev", "prod"]);
    for cluster in envs.clusters() {
        list(cluster.apps(), vec![]).await;
    }
    let (_signal, shutdown) = drain::channel();
    envs.wait_synced(shutdown).await.expect("caches are synced");
}

#[tokio::test]
async fn wait_synced_is_cancelled_by_shutdown() {
    let envs = clusters(&["dev"]);
    let (signal, shutdown) = drain::channel();
    let drained = tokio::spawn(signal.drain());

    let error = envs
        .wait_synced(shutdown)
        .await
        .expect_err("shutdown must cancel the wait");
    assert!(matches!(error, StartError::Cancelled { cluster } if cluster == "dev"));
    drained.await.expect("drain must complete");
}

#[test]
fn selector_labels() {
    let labels = btreemap! {
        "app".to_string() => "frontend".to_string(),
        "team".to_string() => "team-a".to_string(),
    };
    let selector = Selector::equals("app", "frontend")
        .expect("selector must be valid");
    assert!(selector.matches(Some(&labels)));
    assert!(!selector.matches(None));
}
