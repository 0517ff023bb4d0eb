use crate::Store;
use ahash::AHashMap as HashMap;
use workload_api_k8s_api::{DynamicObject, Job, Kind, Pod};

/// Objects in this namespace are never indexed for optional kinds.
const PLATFORM_NAMESPACE: &str = "nais-system";

/// One environment: a cluster and the caches mirrored from it.
#[derive(Clone, Debug)]
pub struct Cluster {
    name: String,
    gcp: bool,
    apps: Store<DynamicObject>,
    naisjobs: Store<DynamicObject>,
    pods: Store<Pod>,
    jobs: Store<Job>,
    optional: HashMap<Kind, Store<DynamicObject>>,
}

impl Cluster {
    /// Creates empty caches for the mandatory kinds and for each of `capabilities`.
    ///
    /// GCP-only kinds are ignored unless the cluster runs on GCP.
    pub fn new(name: impl Into<String>, gcp: bool, capabilities: impl IntoIterator<Item = Kind>) -> Self {
        let optional = capabilities
            .into_iter()
            .filter(|k| Kind::OPTIONAL.contains(k))
            .filter(|k| gcp || !k.is_gcp_only())
            .map(|k| (k, Store::excluding(PLATFORM_NAMESPACE)))
            .collect();

        Self {
            name: name.into(),
            gcp,
            apps: Store::default(),
            naisjobs: Store::default(),
            pods: Store::default(),
            jobs: Store::default(),
            optional,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_gcp(&self) -> bool {
        self.gcp
    }

    pub fn apps(&self) -> &Store<DynamicObject> {
        &self.apps
    }

    pub fn naisjobs(&self) -> &Store<DynamicObject> {
        &self.naisjobs
    }

    pub fn pods(&self) -> &Store<Pod> {
        &self.pods
    }

    pub fn jobs(&self) -> &Store<Job> {
        &self.jobs
    }

    /// The cache for an optional kind, if the cluster serves it.
    pub fn optional(&self, kind: Kind) -> Option<&Store<DynamicObject>> {
        self.optional.get(&kind)
    }

    pub fn has_capability(&self, kind: Kind) -> bool {
        self.optional.contains_key(&kind)
    }

    /// Every cache untyped by kind, ordered by kind.
    pub fn dynamic_stores(&self) -> Vec<(Kind, &Store<DynamicObject>)> {
        let mut stores = vec![(Kind::Application, &self.apps), (Kind::Naisjob, &self.naisjobs)];
        stores.extend(self.optional.iter().map(|(k, s)| (*k, s)));
        stores.sort_by_key(|(k, _)| *k);
        stores
    }
}
