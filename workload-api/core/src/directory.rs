use serde::Deserialize;

/// The human on whose behalf a request is made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTeam {
    pub slug: String,
    #[serde(default)]
    pub google_group_email: Option<String>,
}

/// Team membership as known to the platform's team registry.
#[async_trait::async_trait]
pub trait TeamDirectory: Send + Sync {
    async fn team_exists(&self, team: &str) -> anyhow::Result<bool>;

    async fn user_teams(&self, user_id: &str) -> anyhow::Result<Vec<UserTeam>>;
}
