use kube::api::{ApiResource, GroupVersionKind};
use std::fmt;

/// The resource kinds mirrored from each cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Application,
    Naisjob,
    Pod,
    Job,
    Topic,
    StorageBucket,
    BigQueryDataset,
    SqlInstance,
    SqlDatabase,
    OpenSearch,
    Valkey,
}

impl Kind {
    /// Kinds that are only watched when the cluster serves them.
    pub const OPTIONAL: [Kind; 7] = [
        Kind::Topic,
        Kind::StorageBucket,
        Kind::BigQueryDataset,
        Kind::SqlInstance,
        Kind::SqlDatabase,
        Kind::OpenSearch,
        Kind::Valkey,
    ];

    fn gvk_plural(&self) -> (GroupVersionKind, &'static str) {
        let (group, version, kind, plural) = match self {
            Self::Application => ("nais.io", "v1alpha1", "Application", "applications"),
            Self::Naisjob => ("nais.io", "v1", "Naisjob", "naisjobs"),
            Self::Pod => ("", "v1", "Pod", "pods"),
            Self::Job => ("batch", "v1", "Job", "jobs"),
            Self::Topic => ("kafka.nais.io", "v1", "Topic", "topics"),
            Self::StorageBucket => (
                "storage.cnrm.cloud.google.com",
                "v1beta1",
                "StorageBucket",
                "storagebuckets",
            ),
            Self::BigQueryDataset => (
                "google.nais.io",
                "v1",
                "BigQueryDataset",
                "bigquerydatasets",
            ),
            Self::SqlInstance => (
                "sql.cnrm.cloud.google.com",
                "v1beta1",
                "SQLInstance",
                "sqlinstances",
            ),
            Self::SqlDatabase => (
                "sql.cnrm.cloud.google.com",
                "v1beta1",
                "SQLDatabase",
                "sqldatabases",
            ),
            Self::OpenSearch => ("aiven.io", "v1alpha1", "OpenSearch", "opensearches"),
            Self::Valkey => ("aiven.io", "v1alpha1", "Valkey", "valkeys"),
        };
        (GroupVersionKind::gvk(group, version, kind), plural)
    }

    pub fn api_resource(&self) -> ApiResource {
        let (gvk, plural) = self.gvk_plural();
        ApiResource::from_gvk_with_plural(&gvk, plural)
    }

    /// The `group/version` string used for discovery.
    pub fn group_version(&self) -> String {
        self.api_resource().api_version
    }

    pub fn plural(&self) -> &'static str {
        self.gvk_plural().1
    }

    /// Google Cloud Config Connector kinds only exist on GCP clusters.
    pub fn is_gcp_only(&self) -> bool {
        matches!(
            self,
            Self::StorageBucket | Self::BigQueryDataset | Self::SqlInstance | Self::SqlDatabase
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Naisjob => "naisjob",
            Self::Pod => "pod",
            Self::Job => "job",
            Self::Topic => "topic",
            Self::StorageBucket => "storagebucket",
            Self::BigQueryDataset => "bigquerydataset",
            Self::SqlInstance => "sqlinstance",
            Self::SqlDatabase => "sqldatabase",
            Self::OpenSearch => "opensearch",
            Self::Valkey => "valkey",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_resources() {
        let app = Kind::Application.api_resource();
        assert_eq!(app.api_version, "nais.io/v1alpha1");
        assert_eq!(app.plural, "applications");
        assert_eq!(Kind::Pod.group_version(), "v1");
        assert_eq!(
            Kind::SqlInstance.group_version(),
            "sql.cnrm.cloud.google.com/v1beta1"
        );
        assert!(Kind::StorageBucket.is_gcp_only());
        assert!(!Kind::Topic.is_gcp_only());
    }
}
