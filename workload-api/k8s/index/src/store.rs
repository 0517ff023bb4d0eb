use ahash::AHashMap as HashMap;
use kube::{Resource, ResourceExt};
use kubert::index::{IndexNamespacedResource, NamespacedRemoved};
use parking_lot::RwLock;
use std::{fmt, sync::Arc};
use workload_api_k8s_api::{labels::Map, Selector};

/// A read-only snapshot of one resource kind in one cluster, kept current by a watch.
///
/// The shared [`Index`] is updated with [`kubert::index::namespaced`].
pub struct Store<K>(Arc<RwLock<Index<K>>>);

/// The objects of one kind, by namespace and name.
pub struct Index<K> {
    by_ns: HashMap<String, HashMap<String, Arc<K>>>,
    synced: bool,
    excluded_namespace: Option<&'static str>,
}

// === impl Store ===

impl<K> Default for Store<K> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<K> Clone for Store<K> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K> fmt::Debug for Store<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.0.read();
        f.debug_struct("Store")
            .field("namespaces", &index.by_ns.len())
            .field("synced", &index.synced)
            .finish()
    }
}

impl<K> Store<K> {
    fn new(excluded_namespace: Option<&'static str>) -> Self {
        Self(Arc::new(RwLock::new(Index {
            by_ns: HashMap::default(),
            synced: false,
            excluded_namespace,
        })))
    }

    /// A store that never indexes objects in `namespace`.
    pub fn excluding(namespace: &'static str) -> Self {
        Self::new(Some(namespace))
    }

    /// The index a watch updates.
    pub fn shared(&self) -> Arc<RwLock<Index<K>>> {
        self.0.clone()
    }

    /// True once the first complete listing has been indexed. Never reverts.
    pub fn is_synced(&self) -> bool {
        self.0.read().synced
    }

    pub fn len(&self) -> usize {
        self.0.read().by_ns.values().map(|objs| objs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.0.read().by_ns.get(namespace)?.get(name).cloned()
    }
}

impl<K: Resource> Store<K> {
    /// Lists the objects in `namespace` whose labels match `selector`, ordered by name.
    pub fn list(&self, namespace: &str, selector: &Selector) -> Vec<Arc<K>> {
        let index = self.0.read();
        let Some(objs) = index.by_ns.get(namespace) else {
            return vec![];
        };
        let mut objs = objs
            .values()
            .filter(|o| selector.matches(labels(o.as_ref())))
            .cloned()
            .collect::<Vec<_>>();
        objs.sort_by(|a, b| a.meta().name.cmp(&b.meta().name));
        objs
    }

    /// Lists every object in every namespace, ordered by namespace and name.
    pub fn list_all(&self) -> Vec<Arc<K>> {
        let index = self.0.read();
        let mut objs = index
            .by_ns
            .values()
            .flat_map(|objs| objs.values().cloned())
            .collect::<Vec<_>>();
        objs.sort_by(|a, b| {
            (&a.meta().namespace, &a.meta().name).cmp(&(&b.meta().namespace, &b.meta().name))
        });
        objs
    }
}

// === impl Index ===

impl<K> Index<K> {
    fn is_excluded(&self, namespace: &str) -> bool {
        self.excluded_namespace == Some(namespace)
    }
}

impl<K: Resource> IndexNamespacedResource<K> for Index<K> {
    fn apply(&mut self, obj: K) {
        let namespace = obj.namespace().unwrap_or_default();
        if self.is_excluded(&namespace) {
            return;
        }
        let name = obj.name_any();
        tracing::trace!(%namespace, %name, "Applying");
        self.by_ns
            .entry(namespace)
            .or_default()
            .insert(name, Arc::new(obj));
    }

    fn delete(&mut self, namespace: String, name: String) {
        tracing::trace!(%namespace, %name, "Deleting");
        if let Some(objs) = self.by_ns.get_mut(&namespace) {
            objs.remove(&name);
            if objs.is_empty() {
                self.by_ns.remove(&namespace);
            }
        }
    }

    /// Replaces the snapshot with a completed relist under a single write lock, so readers never
    /// observe a partially-listed store.
    fn reset(&mut self, objs: Vec<K>, _removed: NamespacedRemoved) {
        let mut by_ns = HashMap::<String, HashMap<String, Arc<K>>>::default();
        for obj in objs {
            let namespace = obj.namespace().unwrap_or_default();
            if self.is_excluded(&namespace) {
                continue;
            }
            by_ns
                .entry(namespace)
                .or_default()
                .insert(obj.name_any(), Arc::new(obj));
        }

        self.by_ns = by_ns;
        if !self.synced {
            tracing::debug!("Synced");
            self.synced = true;
        }
    }
}

fn labels<K: Resource>(obj: &K) -> Option<&Map> {
    obj.meta().labels.as_ref()
}
