use crate::{access_policy::Rule, run, Instance, Run, Workload, CANONICAL_REGISTRY};
use serde::Serialize;


/// Overall health of a workload. Ordered so that a later variant is strictly worse.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    Nais,
    NotNais,
    Failing,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorLevel {
    Error,
    Warning,
    Todo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub state: State,
    pub errors: Vec<StateError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StateError {
    pub revision: String,
    pub level: ErrorLevel,
    #[serde(flatten)]
    pub kind: StateErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateErrorKind {
    InvalidNaisYaml {
        detail: String,
    },
    SynchronizationFailing {
        detail: String,
    },
    NewInstancesFailing {
        failing_instances: Vec<String>,
    },
    NoRunningInstances,
    FailedRun {
        run_name: String,
        run_message: String,
    },
    DeprecatedRegistry {
        registry: String,
        repository: String,
        name: String,
        tag: String,
    },
    DeprecatedIngress {
        ingress: String,
    },
    InboundAccess {
        rule: Rule,
    },
    OutboundAccess {
        rule: Rule,
    },
}

/// The `SynchronizationState` condition reported for a workload's manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncCondition {
    pub reason: SyncReason,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncReason {
    RolloutComplete,
    Synchronized,
    FailedGenerate,
    FailedPrepare,
    FailedSynchronization,
    Retrying,
    Other(String),
}

// === impl Status ===

impl Default for Status {
    fn default() -> Self {
        Self {
            state: State::Nais,
            errors: Vec::new(),
        }
    }
}

impl Status {
    fn raise(&mut self, state: State) {
        if state > self.state {
            self.state = state;
        }
    }

    fn push(&mut self, workload: &Workload, level: ErrorLevel, kind: StateErrorKind) {
        self.errors.push(StateError {
            revision: workload.revision().to_string(),
            level,
            kind,
        });
    }
}

// === impl SyncReason ===

impl From<&str> for SyncReason {
    fn from(reason: &str) -> Self {
        match reason {
            "RolloutComplete" => Self::RolloutComplete,
            "Synchronized" => Self::Synchronized,
            "FailedGenerate" => Self::FailedGenerate,
            "FailedPrepare" => Self::FailedPrepare,
            "FailedSynchronization" => Self::FailedSynchronization,
            "Retrying" => Self::Retrying,
            other => Self::Other(other.to_string()),
        }
    }
}

// === synthesis ===

/// Computes an application's status from its sync condition, its instances and its resolved
/// access policy.
pub fn app_status(
    app: &Workload,
    condition: Option<&SyncCondition>,
    instances: &[Instance],
) -> Status {
    let mut status = Status::default();
    let failing = instances.iter().filter(|i| i.is_failing()).count();

    if let Some(condition) = condition {
        match condition.reason {
            SyncReason::FailedGenerate => {
                status.push(
                    app,
                    ErrorLevel::Error,
                    StateErrorKind::InvalidNaisYaml {
                        detail: condition.message.clone(),
                    },
                );
                status.raise(State::NotNais);
            }
            SyncReason::FailedPrepare
            | SyncReason::Retrying
            | SyncReason::FailedSynchronization => {
                status.push(
                    app,
                    ErrorLevel::Error,
                    StateErrorKind::SynchronizationFailing {
                        detail: condition.message.clone(),
                    },
                );
                status.raise(State::NotNais);
            }
            SyncReason::Synchronized => {
                let failing_instances = instances
                    .iter()
                    .filter(|i| i.is_failing())
                    .map(|i| i.name.clone())
                    .collect();
                status.push(
                    app,
                    ErrorLevel::Warning,
                    StateErrorKind::NewInstancesFailing { failing_instances },
                );
                status.raise(State::NotNais);
            }
            SyncReason::RolloutComplete | SyncReason::Other(_) => {}
        }
    }

    if (instances.is_empty() || failing == instances.len()) && app.has_scaling_bounds() {
        status.push(app, ErrorLevel::Error, StateErrorKind::NoRunningInstances);
        status.raise(State::Failing);
    }

    check_registry(app, &mut status);
    check_ingresses(app, &mut status);

    // Only reachable while the state is still `Nais`.
    let rollout_complete =
        condition.is_some_and(|c| c.reason == SyncReason::RolloutComplete) && failing == 0;
    if rollout_complete && status.state != State::Failing && status.state != State::NotNais {
        status.state = State::Nais;
    }

    check_access_policy(app, &mut status);
    status
}

/// Computes a job's status from its sync condition, its runs and its resolved access policy.
pub fn job_status(job: &Workload, condition: Option<&SyncCondition>, runs: &[Run]) -> Status {
    let mut status = Status::default();

    if let Some(condition) = condition {
        match condition.reason {
            SyncReason::FailedGenerate | SyncReason::FailedPrepare => {
                let level = if condition.reason == SyncReason::FailedPrepare {
                    ErrorLevel::Warning
                } else {
                    ErrorLevel::Error
                };
                status.push(
                    job,
                    level,
                    StateErrorKind::InvalidNaisYaml {
                        detail: condition.message.clone(),
                    },
                );
                status.raise(State::NotNais);
            }
            SyncReason::Retrying | SyncReason::FailedSynchronization => {
                status.push(
                    job,
                    ErrorLevel::Error,
                    StateErrorKind::SynchronizationFailing {
                        detail: condition.message.clone(),
                    },
                );
                status.raise(State::NotNais);
            }
            SyncReason::RolloutComplete | SyncReason::Synchronized | SyncReason::Other(_) => {}
        }
    }

    if let Some(latest) = run::most_recent(runs).filter(|r| r.failed) {
        status.push(
            job,
            ErrorLevel::Warning,
            StateErrorKind::FailedRun {
                run_name: latest.name.clone(),
                run_message: latest.message.clone(),
            },
        );
        status.raise(State::Failing);
    }

    check_registry(job, &mut status);
    check_ingresses(job, &mut status);
    check_access_policy(job, &mut status);
    status
}

fn check_registry(workload: &Workload, status: &mut Status) {
    if workload.image.contains(CANONICAL_REGISTRY) {
        return;
    }
    let kind = parse_image(&workload.image);
    status.push(workload, ErrorLevel::Todo, kind);
}

fn parse_image(image: &str) -> StateErrorKind {
    let mut parts = image.split(':');
    let path = parts.next().unwrap_or_default();
    let tag = parts.next().unwrap_or("unknown");

    let segments = path.split('/').collect::<Vec<_>>();
    let registry = segments.first().copied().unwrap_or_default();
    let name = segments.last().copied().unwrap_or_default();
    let repository = if segments.len() > 2 {
        segments[1..segments.len() - 1].join("/")
    } else {
        String::new()
    };

    StateErrorKind::DeprecatedRegistry {
        registry: registry.to_string(),
        repository,
        name: name.to_string(),
        tag: tag.to_string(),
    }
}

fn check_ingresses(workload: &Workload, status: &mut Status) {
    let deprecated = deprecated_ingress_domains(&workload.environment);
    for ingress in &workload.ingresses {
        let Some((_, domain)) = ingress_host(ingress).split_once('.') else {
            continue;
        };
        if deprecated.contains(&domain) {
            status.push(
                workload,
                ErrorLevel::Todo,
                StateErrorKind::DeprecatedIngress {
                    ingress: ingress.clone(),
                },
            );
        }
    }
}

fn ingress_host(ingress: &str) -> &str {
    let rest = ingress
        .split_once("://")
        .map_or(ingress, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

fn deprecated_ingress_domains(environment: &str) -> &'static [&'static str] {
    match environment {
        "dev-fss" => &[
            "adeo.no",
            "intern.dev.adeo.no",
            "dev-fss.nais.io",
            "dev.adeo.no",
            "dev.intern.nav.no",
            "nais.preprod.local",
        ],
        "dev-gcp" => &[
            "dev-gcp.nais.io",
            "dev.intern.nav.no",
            "dev.nav.no",
            "intern.nav.no",
            "dev.adeo.no",
            "labs.nais.io",
            "ekstern.dev.nais.io",
        ],
        "prod-fss" => &["adeo.no", "nais.adeo.no", "prod-fss.nais.io"],
        "prod-gcp" => &["dev.intern.nav.no", "prod-gcp.nais.io"],
        _ => &[],
    }
}

fn check_access_policy(workload: &Workload, status: &mut Status) {
    let policy = &workload.access_policy;
    for rule in policy.inbound.iter().filter(|r| !r.mutual) {
        status.push(
            workload,
            ErrorLevel::Warning,
            StateErrorKind::InboundAccess { rule: rule.clone() },
        );
        status.raise(State::NotNais);
    }
    for rule in policy.outbound.iter().filter(|r| !r.mutual) {
        status.push(
            workload,
            ErrorLevel::Warning,
            StateErrorKind::OutboundAccess { rule: rule.clone() },
        );
        status.raise(State::NotNais);
    }
}
