use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use workload_api_core::{TeamDirectory, UserTeam};

/// A team directory loaded once from a YAML file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StaticDirectory {
    #[serde(default)]
    teams: Vec<Team>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Team {
    slug: String,
    #[serde(default)]
    google_group_email: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

impl StaticDirectory {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid team directory")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let directory = Self::from_yaml(&yaml)
            .with_context(|| format!("failed to load {}", path.display()))?;
        tracing::info!(path = %path.display(), teams = directory.teams.len(), "Loaded team directory");
        Ok(directory)
    }
}

#[async_trait::async_trait]
impl TeamDirectory for StaticDirectory {
    async fn team_exists(&self, team: &str) -> Result<bool> {
        Ok(self.teams.iter().any(|t| t.slug == team))
    }

    async fn user_teams(&self, user_id: &str) -> Result<Vec<UserTeam>> {
        Ok(self
            .teams
            .iter()
            .filter(|t| t.members.iter().any(|m| m == user_id))
            .map(|t| UserTeam {
                slug: t.slug.clone(),
                google_group_email: t.google_group_email.clone(),
            })
            .collect())
    }
}
