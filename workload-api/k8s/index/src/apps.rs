use crate::{mapper, Cluster, Environments, Error};
use workload_api_core::{
    access_policy::{resolve_access_policy, Origin},
    status, Instance, Workload, WorkloadKind,
};
use workload_api_k8s_api::{DynamicObject, Kind, ResourceExt, Selector};

impl Environments {
    /// Returns the application `name` owned by `team` in `environment`, with resolved access
    /// rules and a synthesized status, or `None` if no such application exists.
    pub fn app(&self, name: &str, team: &str, environment: &str) -> Result<Option<Workload>, Error> {
        let cluster = self.cluster(environment)?;
        let Some(obj) = cluster.apps().get(team, name) else {
            return Ok(None);
        };
        self.resolve_app(cluster, &obj).map(Some)
    }

    /// Returns all of `team`'s applications in the environments selected by `environments`
    /// (all, if empty), ordered by name and then environment.
    pub fn apps(&self, team: &str, environments: &[String]) -> Result<Vec<Workload>, Error> {
        let mut apps = Vec::new();
        for cluster in self.filtered(environments) {
            for obj in cluster.apps().list(team, &Selector::default()) {
                apps.push(self.resolve_app(cluster, &obj)?);
            }
        }
        apps.sort_by(|a, b| (&a.name, &a.environment).cmp(&(&b.name, &b.environment)));
        Ok(apps)
    }

    /// False for unknown environments.
    pub fn app_exists(&self, environment: &str, team: &str, name: &str) -> bool {
        self.cluster(environment)
            .is_ok_and(|c| c.apps().get(team, name).is_some())
    }

    /// Returns the pods of application `app`, selected by `app=<name>`.
    pub fn instances(&self, team: &str, environment: &str, app: &str) -> Result<Vec<Instance>, Error> {
        let cluster = self.cluster(environment)?;
        let selector = Selector::equals("app", app).map_err(Error::selector(environment, team))?;
        Ok(cluster
            .pods()
            .list(team, &selector)
            .iter()
            .map(|pod| mapper::to_instance(pod, environment))
            .collect())
    }

    /// Renders the workload's resource as YAML, limited to its identity, labels and spec.
    pub fn manifest(
        &self,
        name: &str,
        team: &str,
        environment: &str,
        kind: WorkloadKind,
    ) -> Result<Option<String>, Error> {
        let cluster = self.cluster(environment)?;
        let (store, kind) = match kind {
            WorkloadKind::App => (cluster.apps(), Kind::Application),
            WorkloadKind::Job => (cluster.naisjobs(), Kind::Naisjob),
        };
        let Some(obj) = store.get(team, name) else {
            return Ok(None);
        };

        let resource = kind.api_resource();
        let manifest = serde_json::json!({
            "apiVersion": resource.api_version,
            "kind": resource.kind,
            "metadata": {
                "labels": obj.labels(),
                "name": obj.name_any(),
                "namespace": obj.namespace(),
            },
            "spec": obj.data.get("spec"),
        });
        serde_yaml::to_string(&manifest)
            .map(Some)
            .map_err(|source| Error::Manifest {
                environment: environment.to_string(),
                team: team.to_string(),
                name: name.to_string(),
                source,
            })
    }

    fn resolve_app(&self, cluster: &Cluster, obj: &DynamicObject) -> Result<Workload, Error> {
        let team = obj.namespace().unwrap_or_default();
        let mapped = mapper::to_app(obj, cluster.name())
            .map_err(Error::conversion(cluster.name(), &team, &obj.name_any()))?;

        let mut app = mapped.workload;
        let origin = Origin {
            environment: cluster.name(),
            team: &app.team,
            name: &app.name,
        };
        let access_policy = resolve_access_policy(&app.access_policy, &origin, self);
        app.access_policy = access_policy;

        let instances = self.instances(&app.team, cluster.name(), &app.name)?;
        app.status = status::app_status(&app, mapped.condition.as_ref(), &instances);
        Ok(app)
    }
}
