use crate::{Cluster, Environments};
use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};
use workload_api_k8s_api::Kind;

#[derive(Debug)]
struct Instrumented(Environments);

/// Registers gauges describing every cluster's caches, computed at scrape time.
pub fn register(reg: &mut Registry, environments: Environments) {
    reg.register_collector(Box::new(Instrumented(environments)));
}

struct CacheState {
    kind: Kind,
    objects: usize,
    synced: bool,
}

fn cache_states(cluster: &Cluster) -> Vec<CacheState> {
    let mut states = cluster
        .dynamic_stores()
        .into_iter()
        .map(|(kind, store)| CacheState {
            kind,
            objects: store.len(),
            synced: store.is_synced(),
        })
        .collect::<Vec<_>>();
    states.push(CacheState {
        kind: Kind::Pod,
        objects: cluster.pods().len(),
        synced: cluster.pods().is_synced(),
    });
    states.push(CacheState {
        kind: Kind::Job,
        objects: cluster.jobs().len(),
        synced: cluster.jobs().is_synced(),
    });
    states.sort_by_key(|s| s.kind);
    states
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let states = self
            .0
            .clusters()
            .map(|c| (c.name(), cache_states(c)))
            .collect::<Vec<_>>();

        let mut objects_encoder = encoder.encode_descriptor(
            "objects",
            "The number of objects in a cluster's cache",
            None,
            MetricType::Gauge,
        )?;
        for (cluster, caches) in &states {
            for cache in caches {
                let labels = [("cluster", *cluster), ("kind", cache.kind.as_str())];
                let objects = ConstGauge::new(cache.objects as i64);
                objects.encode(objects_encoder.encode_family(&labels)?)?;
            }
        }

        let mut synced_encoder = encoder.encode_descriptor(
            "synced",
            "Whether a cluster's cache has completed its initial listing",
            None,
            MetricType::Gauge,
        )?;
        for (cluster, caches) in &states {
            for cache in caches {
                let labels = [("cluster", *cluster), ("kind", cache.kind.as_str())];
                let synced = ConstGauge::new(i64::from(cache.synced));
                synced.encode(synced_encoder.encode_family(&labels)?)?;
            }
        }

        Ok(())
    }
}
