use crate::clusters::ClusterConfig;
use chrono::{DateTime, Utc};
use kube::api::{Api, DeleteParams, Patch, PatchParams};
use serde_json::json;
use std::{collections::BTreeMap, sync::Arc};
use workload_api_core::{Actor, TeamDirectory};
use workload_api_k8s_api::{annotations, Deployment, DynamicObject, Kind};

/// Issues mutating calls as the acting user rather than as this service.
///
/// Clients are built for every call; the identity they carry varies per request.
#[derive(Clone)]
pub struct Impersonator {
    configs: Arc<BTreeMap<String, kube::Config>>,
    directory: Arc<dyn TeamDirectory>,
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("unknown environment {0:?}")]
    UnknownEnvironment(String),

    #[error("failed to look up teams for {user}")]
    Directory {
        user: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to build impersonated client for {environment}")]
    Client {
        environment: String,
        #[source]
        source: kube::Error,
    },

    #[error("request for {name} in {environment}/{team} failed")]
    Api {
        environment: String,
        team: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}

// === impl Impersonator ===

impl Impersonator {
    pub fn new<'a>(
        clusters: impl IntoIterator<Item = &'a ClusterConfig>,
        directory: Arc<dyn TeamDirectory>,
    ) -> Self {
        let configs = clusters
            .into_iter()
            .map(|c| (c.name.clone(), c.config.clone()))
            .collect();
        Self {
            configs: Arc::new(configs),
            directory,
        }
    }

    /// Builds one client per environment, acting as `actor` with their teams' groups.
    pub async fn clients(
        &self,
        actor: &Actor,
    ) -> Result<BTreeMap<String, kube::Client>, WriteError> {
        let groups = self.groups(actor).await?;
        self.configs
            .iter()
            .map(|(environment, config)| {
                let client = build(environment, config, actor, &groups)?;
                Ok((environment.clone(), client))
            })
            .collect()
    }

    pub async fn delete_app(
        &self,
        actor: &Actor,
        environment: &str,
        team: &str,
        name: &str,
    ) -> Result<(), WriteError> {
        self.delete(actor, Kind::Application, environment, team, name)
            .await
    }

    pub async fn delete_job(
        &self,
        actor: &Actor,
        environment: &str,
        team: &str,
        name: &str,
    ) -> Result<(), WriteError> {
        self.delete(actor, Kind::Naisjob, environment, team, name)
            .await
    }

    /// Triggers a rolling restart of an application's deployment.
    pub async fn restart_app(
        &self,
        actor: &Actor,
        environment: &str,
        team: &str,
        name: &str,
    ) -> Result<(), WriteError> {
        let client = self.client(actor, environment).await?;
        let api = Api::<Deployment>::namespaced(client, team);
        let patch = restart_patch(Utc::now());
        api.patch(name, &PatchParams::default(), &Patch::Strategic(patch))
            .await
            .map_err(WriteError::api(environment, team, name))?;
        tracing::info!(user = %actor.email, %environment, %team, %name, "Restarted application");
        Ok(())
    }

    async fn delete(
        &self,
        actor: &Actor,
        kind: Kind,
        environment: &str,
        team: &str,
        name: &str,
    ) -> Result<(), WriteError> {
        let client = self.client(actor, environment).await?;
        let api = Api::<DynamicObject>::namespaced_with(client, team, &kind.api_resource());
        api.delete(name, &DeleteParams::default())
            .await
            .map_err(WriteError::api(environment, team, name))?;
        tracing::info!(user = %actor.email, %environment, %team, %name, %kind, "Deleted");
        Ok(())
    }

    async fn client(&self, actor: &Actor, environment: &str) -> Result<kube::Client, WriteError> {
        let config = self
            .configs
            .get(environment)
            .ok_or_else(|| WriteError::UnknownEnvironment(environment.to_string()))?;
        let groups = self.groups(actor).await?;
        build(environment, config, actor, &groups)
    }

    async fn groups(&self, actor: &Actor) -> Result<Vec<String>, WriteError> {
        let teams = self
            .directory
            .user_teams(&actor.user_id)
            .await
            .map_err(|source| WriteError::Directory {
                user: actor.user_id.clone(),
                source: source.into(),
            })?;
        Ok(teams
            .into_iter()
            .filter_map(|t| t.google_group_email)
            .collect())
    }
}

impl std::fmt::Debug for Impersonator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Impersonator")
            .field("environments", &self.configs.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn build(
    environment: &str,
    config: &kube::Config,
    actor: &Actor,
    groups: &[String],
) -> Result<kube::Client, WriteError> {
    kube::Client::try_from(impersonated(config, actor, groups)).map_err(|source| {
        WriteError::Client {
            environment: environment.to_string(),
            source,
        }
    })
}

fn impersonated(config: &kube::Config, actor: &Actor, groups: &[String]) -> kube::Config {
    let mut config = config.clone();
    config.auth_info.impersonate = Some(actor.email.clone());
    config.auth_info.impersonate_groups = Some(groups.to_vec());
    config
}

/// The pod template annotation change that makes a deployment roll its pods.
fn restart_patch(now: DateTime<Utc>) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        (annotations::RESTARTED_AT): now.to_rfc3339(),
                    },
                },
            },
        },
    })
}

// === impl WriteError ===

impl WriteError {
    fn api(environment: &str, team: &str, name: &str) -> impl FnOnce(kube::Error) -> Self {
        let environment = environment.to_string();
        let team = team.to_string();
        let name = name.to_string();
        move |source| Self::Api {
            environment,
            team,
            name,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use chrono::TimeZone;
    use workload_api_core::UserTeam;

    fn actor() -> Actor {
        Actor {
            user_id: "u-1".to_string(),
            email: "ola@example.com".to_string(),
        }
    }

    fn directory() -> Arc<dyn TeamDirectory> {
        let directory = StaticDirectory::from_yaml(
            r#"
teams:
  - slug: alpha
    googleGroupEmail: alpha@example.com
    members: [u-1]
  - slug: beta
    members: [u-1]
  - slug: gamma
    googleGroupEmail: gamma@example.com
    members: [u-2]
"#,
        )
        .expect("directory must parse");
        Arc::new(directory)
    }

    async fn cluster(entry: &str) -> ClusterConfig {
        let cluster = entry.parse().expect("entry must parse");
        ClusterConfig::from_static(&cluster)
            .await
            .expect("config must build")
    }

    async fn impersonator() -> Impersonator {
        Impersonator::new([&cluster("dev|k8s.example.com|token").await], directory())
    }

    #[tokio::test]
    async fn groups_are_the_actors_teams() {
        let groups = impersonator().await.groups(&actor()).await.expect("lookup");
        assert_eq!(groups, ["alpha@example.com"]);
    }

    #[tokio::test]
    async fn impersonates_actor() {
        let impersonator = impersonator().await;
        let config = impersonated(
            &impersonator.configs["dev"],
            &actor(),
            &["alpha@example.com".to_string()],
        );
        assert_eq!(
            config.auth_info.impersonate.as_deref(),
            Some("ola@example.com")
        );
        assert_eq!(
            config.auth_info.impersonate_groups,
            Some(vec!["alpha@example.com".to_string()])
        );
        // The service's own credentials are kept to authenticate the impersonation.
        assert!(config.auth_info.token.is_some());
    }

    #[tokio::test]
    async fn unknown_environment() {
        let error = impersonator()
            .await
            .delete_app(&actor(), "prod", "alpha", "app")
            .await
            .expect_err("environment is unknown");
        assert!(matches!(error, WriteError::UnknownEnvironment(env) if env == "prod"));
    }

    #[tokio::test]
    async fn builds_client_per_environment() {
        let dev = cluster("dev|k8s.dev.example.com|token").await;
        let prod = cluster("prod|k8s.prod.example.com|token").await;
        let clients = Impersonator::new([&dev, &prod], directory())
            .clients(&actor())
            .await
            .expect("clients must build");
        assert_eq!(clients.keys().collect::<Vec<_>>(), ["dev", "prod"]);
    }

    #[tokio::test]
    async fn client_for_one_environment() {
        let dev = cluster("dev|k8s.dev.example.com|token").await;
        let mut broken = cluster("broken|k8s.broken.example.com|token").await;
        broken.config.root_cert = Some(vec![b"not a certificate".to_vec()]);
        let impersonator = Impersonator::new([&dev, &broken], directory());

        let error = impersonator
            .clients(&actor())
            .await
            .err()
            .expect("broken environment must fail");
        assert!(matches!(error, WriteError::Client { environment, .. } if environment == "broken"));

        impersonator
            .client(&actor(), "dev")
            .await
            .expect("other environments must not be built");
    }

    #[tokio::test]
    async fn unknown_environment_skips_directory() {
        let impersonator = Impersonator::new(
            [&cluster("dev|k8s.example.com|token").await],
            Arc::new(FailingDirectory),
        );
        let error = impersonator
            .restart_app(&actor(), "prod", "alpha", "app")
            .await
            .expect_err("environment is unknown");
        assert!(matches!(error, WriteError::UnknownEnvironment(env) if env == "prod"));
    }

    struct FailingDirectory;

    #[async_trait::async_trait]
    impl TeamDirectory for FailingDirectory {
        async fn team_exists(&self, _team: &str) -> anyhow::Result<bool> {
            anyhow::bail!("directory unavailable")
        }

        async fn user_teams(&self, _user_id: &str) -> anyhow::Result<Vec<UserTeam>> {
            anyhow::bail!("directory unavailable")
        }
    }

    #[test]
    fn restart_patches_pod_template() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 30, 0).unwrap();
        assert_eq!(
            restart_patch(now),
            json!({
                "spec": {
                    "template": {
                        "metadata": {
                            "annotations": {
                                "kubectl.kubernetes.io/restartedAt": "2024-05-17T12:30:00+00:00",
                            },
                        },
                    },
                },
            })
        );
    }
}
