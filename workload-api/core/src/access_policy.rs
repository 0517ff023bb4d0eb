use crate::{Workload, WorkloadKind};
use serde::Serialize;


/// Network rules a workload declares toward its peers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    pub inbound: Vec<Rule>,
    pub outbound: Vec<Rule>,
    pub external: Vec<External>,
}

/// A single access-policy rule.
///
/// `mutual`, `mutual_explanation` and `is_job` are only meaningful once the rule has been
/// returned by [`resolve_rule`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub application: String,
    pub namespace: Option<String>,
    pub cluster: Option<String>,
    pub mutual: bool,
    pub mutual_explanation: Option<MutualExplanation>,
    pub is_job: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct External {
    pub host: Option<String>,
    pub ipv4: Option<String>,
    pub ports: Vec<u16>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutualExplanation {
    AppNotFound,
    RuleNotFound,
    NoZeroTrust,
    Localhost,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// The workload a rule points at, as seen in the target environment.
#[derive(Clone, Debug, PartialEq)]
pub enum Peer {
    App(Workload),
    Job(Workload),
    Absent,
}

/// The workload that declares the rules being resolved.
#[derive(Copy, Clone, Debug)]
pub struct Origin<'a> {
    pub environment: &'a str,
    pub team: &'a str,
    pub name: &'a str,
}

/// Read access to the workloads of every known environment.
pub trait PeerLookup {
    fn has_environment(&self, environment: &str) -> bool;

    /// Returns [`Peer::Absent`] when no workload of `kind` exists. Lookup failures are also
    /// reported as absent.
    fn peer(&self, environment: &str, team: &str, name: &str, kind: WorkloadKind) -> Peer;
}

const LEGACY_SUFFIX: &str = "-token-generator";
const LEGACY_NAMESPACE: &str = "aura";
const PLATFORM_NAMESPACE: &str = "nais-system";

// === impl Rule ===

impl Rule {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    fn is_wildcard(&self) -> bool {
        self.application == "*"
    }

    fn is_legacy_exception(&self, environment: &str) -> bool {
        self.application.ends_with(LEGACY_SUFFIX)
            && self.namespace.as_deref() == Some(LEGACY_NAMESPACE)
            && environment.contains("dev")
    }

    /// Whether this rule, declared on a peer, admits `origin`.
    fn admits(&self, origin: &Origin<'_>) -> bool {
        fn matches(field: Option<&str>, value: &str) -> bool {
            match field {
                None => true,
                Some(f) => f.is_empty() || f == "*" || f == value,
            }
        }

        matches(self.cluster.as_deref(), origin.environment)
            && matches(self.namespace.as_deref(), origin.team)
            && (self.is_wildcard() || self.application == origin.name)
    }
}

// === impl MutualExplanation ===

impl MutualExplanation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppNotFound => "APP_NOT_FOUND",
            Self::RuleNotFound => "RULE_NOT_FOUND",
            Self::NoZeroTrust => "NO_ZERO_TRUST",
            Self::Localhost => "LOCALHOST",
        }
    }
}

// === impl Peer ===

impl Peer {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn workload(&self) -> Option<&Workload> {
        match self {
            Self::App(w) | Self::Job(w) => Some(w),
            Self::Absent => None,
        }
    }

    /// Whether the peer declares a complementary rule admitting `origin`.
    fn reciprocates(&self, direction: Direction, origin: &Origin<'_>) -> bool {
        let Some(workload) = self.workload() else {
            return false;
        };
        let rules = match direction {
            Direction::Outbound => &workload.access_policy.inbound,
            Direction::Inbound => &workload.access_policy.outbound,
        };
        rules.iter().any(|r| r.admits(origin))
    }
}

// === resolution ===

/// Resolves every inbound and outbound rule of `policy` declared by `origin`.
pub fn resolve_access_policy(
    policy: &AccessPolicy,
    origin: &Origin<'_>,
    peers: &impl PeerLookup,
) -> AccessPolicy {
    AccessPolicy {
        inbound: policy
            .inbound
            .iter()
            .map(|r| resolve_rule(r, Direction::Inbound, origin, peers))
            .collect(),
        outbound: policy
            .outbound
            .iter()
            .map(|r| resolve_rule(r, Direction::Outbound, origin, peers))
            .collect(),
        external: policy.external.clone(),
    }
}

/// Decides whether `rule` is reciprocated by the workload it references.
///
/// The returned rule always carries an explicit `mutual` value. When it is false,
/// `mutual_explanation` is set unless the target environment is unknown.
pub fn resolve_rule(
    rule: &Rule,
    direction: Direction,
    origin: &Origin<'_>,
    peers: &impl PeerLookup,
) -> Rule {
    let resolved = Rule {
        mutual: false,
        mutual_explanation: None,
        is_job: false,
        ..rule.clone()
    };

    let environment = rule
        .cluster
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(origin.environment);
    let team = rule
        .namespace
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(origin.team);

    if rule.is_wildcard() || rule.is_legacy_exception(origin.environment) {
        return Rule {
            mutual: true,
            ..resolved
        };
    }

    if direction == Direction::Inbound && rule.application.eq_ignore_ascii_case("localhost") {
        return mutual_because(resolved, MutualExplanation::Localhost);
    }

    if is_zero_trust_exempt(origin.environment, rule) {
        return mutual_because(resolved, MutualExplanation::NoZeroTrust);
    }

    if !peers.has_environment(environment) {
        tracing::warn!(
            cluster = %environment,
            namespace = %team,
            name = %rule.application,
            "Unknown environment; rule can't be verified"
        );
        return resolved;
    }

    let candidates = [
        peers.peer(environment, team, &rule.application, WorkloadKind::App),
        peers.peer(environment, team, &rule.application, WorkloadKind::Job),
    ];
    if candidates.iter().all(Peer::is_absent) {
        return Rule {
            mutual_explanation: Some(MutualExplanation::AppNotFound),
            ..resolved
        };
    }

    for peer in &candidates {
        if peer.reciprocates(direction, origin) {
            return Rule {
                mutual: true,
                is_job: matches!(peer, Peer::Job(_)),
                ..resolved
            };
        }
    }

    Rule {
        mutual_explanation: Some(MutualExplanation::RuleNotFound),
        ..resolved
    }
}

fn mutual_because(rule: Rule, explanation: MutualExplanation) -> Rule {
    Rule {
        mutual: true,
        mutual_explanation: Some(explanation),
        ..rule
    }
}

fn is_zero_trust_exempt(environment: &str, rule: &Rule) -> bool {
    [
        Some(environment),
        rule.cluster.as_deref(),
        rule.namespace.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|f| f.contains("-fss") || f.contains("-external") || f == PLATFORM_NAMESPACE)
}
