use serde::Serialize;
use std::fmt;

/// A stable identifier handed to API consumers, composed as `kind_env_team_name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ident(String);

impl Ident {
    pub fn app(environment: &str, team: &str, name: &str) -> Self {
        Self::compose("app", &[environment, team, name])
    }

    pub fn job(environment: &str, team: &str, name: &str) -> Self {
        Self::compose("job", &[environment, team, name])
    }

    pub fn run(environment: &str, team: &str, name: &str) -> Self {
        Self::compose("run", &[environment, team, name])
    }

    pub fn instance(uid: &str) -> Self {
        Self::compose("pod", &[uid])
    }

    pub fn persistence(kind: &'static str, environment: &str, team: &str, name: &str) -> Self {
        Self::compose(kind, &[environment, team, name])
    }

    fn compose(kind: &str, parts: &[&str]) -> Self {
        let mut id = String::from(kind);
        for part in parts {
            id.push('_');
            id.push_str(part);
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
