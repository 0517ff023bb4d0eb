use crate::{mapper, Cluster, Environments, Error};
use chrono::Utc;
use workload_api_core::{
    access_policy::{resolve_access_policy, Origin},
    run, status, Run, Workload,
};
use workload_api_k8s_api::{DynamicObject, ResourceExt, Selector};

impl Environments {
    /// Returns the naisjob `name` owned by `team` in `environment`, with resolved access rules
    /// and a synthesized status, or `None` if no such job exists.
    pub fn job(&self, name: &str, team: &str, environment: &str) -> Result<Option<Workload>, Error> {
        let cluster = self.cluster(environment)?;
        let Some(obj) = cluster.naisjobs().get(team, name) else {
            return Ok(None);
        };
        self.resolve_job(cluster, &obj).map(Some)
    }

    /// Returns all of `team`'s jobs in the environments selected by `environments` (all, if
    /// empty), ordered by name and then environment.
    pub fn jobs(&self, team: &str, environments: &[String]) -> Result<Vec<Workload>, Error> {
        let mut jobs = Vec::new();
        for cluster in self.filtered(environments) {
            for obj in cluster.naisjobs().list(team, &Selector::default()) {
                jobs.push(self.resolve_job(cluster, &obj)?);
            }
        }
        jobs.sort_by(|a, b| (&a.name, &a.environment).cmp(&(&b.name, &b.environment)));
        Ok(jobs)
    }

    /// False for unknown environments.
    pub fn job_exists(&self, environment: &str, team: &str, name: &str) -> bool {
        self.cluster(environment)
            .is_ok_and(|c| c.naisjobs().get(team, name).is_some())
    }

    /// Returns the runs of naisjob `job`, most recently started first.
    ///
    /// Runs are the batch jobs labeled `app=<job>`; each run's pods are those labeled
    /// `job-name=<run>`.
    pub fn runs(&self, team: &str, environment: &str, job: &str) -> Result<Vec<Run>, Error> {
        let cluster = self.cluster(environment)?;
        let selector = Selector::equals("app", job).map_err(Error::selector(environment, team))?;
        let now = Utc::now();

        let mut runs = Vec::new();
        for batch in cluster.jobs().list(team, &selector) {
            let name = batch.name_any();
            let pods = Selector::equals("job-name", &name)
                .map_err(Error::selector(environment, team))?;
            let pod_names = cluster
                .pods()
                .list(team, &pods)
                .iter()
                .map(|p| p.name_any())
                .collect();
            runs.push(mapper::to_run(&batch, job, pod_names, environment, now));
        }

        run::sort_runs(&mut runs);
        Ok(runs)
    }

    fn resolve_job(&self, cluster: &Cluster, obj: &DynamicObject) -> Result<Workload, Error> {
        let team = obj.namespace().unwrap_or_default();
        let mapped = mapper::to_job(obj, cluster.name())
            .map_err(Error::conversion(cluster.name(), &team, &obj.name_any()))?;

        let mut job = mapped.workload;
        let origin = Origin {
            environment: cluster.name(),
            team: &job.team,
            name: &job.name,
        };
        let access_policy = resolve_access_policy(&job.access_policy, &origin, self);
        job.access_policy = access_policy;

        let runs = self.runs(&job.team, cluster.name(), &job.name)?;
        job.status = status::job_status(&job, mapped.condition.as_ref(), &runs);
        Ok(job)
    }
}
