use kube::{
    api::Api,
    runtime::{watcher, WatchStreamExt},
    Resource,
};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{info_span, Instrument};
use workload_api_k8s_api::{DynamicObject, Job, Kind, Pod, Watch};
use workload_api_k8s_index::{Cluster, Store};

/// Spawns one watch task per cache in `cluster`, each running until the process exits.
pub fn spawn(client: &kube::Client, cluster: &Cluster) {
    for (kind, store) in cluster.dynamic_stores() {
        let api = Api::<DynamicObject>::all_with(client.clone(), &kind.api_resource());
        spawn_watch(cluster.name(), kind, store, api);
    }
    spawn_watch(
        cluster.name(),
        Kind::Pod,
        cluster.pods(),
        Api::<Pod>::all(client.clone()),
    );
    spawn_watch(
        cluster.name(),
        Kind::Job,
        cluster.jobs(),
        Api::<Job>::all(client.clone()),
    );
}

fn spawn_watch<K>(cluster: &str, kind: Kind, store: &Store<K>, api: Api<K>)
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let span = info_span!("watch", %cluster, %kind);
    let events = watcher(api, watcher::Config::default()).default_backoff();
    let events = Watch::from(events).instrument(span.clone()).into_stream();
    tokio::spawn(kubert::index::namespaced(store.shared(), events).instrument(span));
}
