use crate::Ident;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Running,
    Failing,
    Unknown,
}

/// A pod belonging to an application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: Ident,
    pub name: String,
    pub image: String,
    pub restarts: i32,
    pub message: String,
    pub state: InstanceState,
    pub created: Option<DateTime<Utc>>,
    pub environment: String,
    pub team: String,
    pub app: String,
}

impl Instance {
    pub fn is_failing(&self) -> bool {
        self.state == InstanceState::Failing
    }
}
