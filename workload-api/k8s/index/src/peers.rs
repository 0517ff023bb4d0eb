use crate::{
    mapper::{self, Mapped},
    Environments,
};
use workload_api_core::{
    access_policy::{Peer, PeerLookup},
    ConversionError, WorkloadKind,
};
use workload_api_k8s_api::DynamicObject;

type ToWorkload = fn(&DynamicObject, &str) -> Result<Mapped, ConversionError>;

impl PeerLookup for Environments {
    fn has_environment(&self, environment: &str) -> bool {
        self.contains(environment)
    }

    fn peer(&self, environment: &str, team: &str, name: &str, kind: WorkloadKind) -> Peer {
        let Ok(cluster) = self.cluster(environment) else {
            return Peer::Absent;
        };

        let (store, to_workload): (_, ToWorkload) = match kind {
            WorkloadKind::App => (cluster.apps(), mapper::to_app),
            WorkloadKind::Job => (cluster.naisjobs(), mapper::to_job),
        };
        let Some(obj) = store.get(team, name) else {
            return Peer::Absent;
        };

        match to_workload(&obj, environment) {
            Ok(mapped) if kind == WorkloadKind::App => Peer::App(mapped.workload),
            Ok(mapped) => Peer::Job(mapped.workload),
            Err(error) => {
                tracing::debug!(
                    cluster = %environment,
                    namespace = %team,
                    %name,
                    %kind,
                    %error,
                    "Failed to convert peer; treating it as absent"
                );
                Peer::Absent
            }
        }
    }
}
