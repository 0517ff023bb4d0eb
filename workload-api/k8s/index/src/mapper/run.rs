use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::JobCondition;
use workload_api_core::{Ident, Run};
use workload_api_k8s_api::{Job, JobStatus, ResourceExt};

/// Maps a batch job created for the naisjob `job` to a run.
///
/// `now` bounds the duration of runs that are still in progress.
pub fn to_run(
    batch: &Job,
    job: &str,
    pod_names: Vec<String>,
    environment: &str,
    now: DateTime<Utc>,
) -> Run {
    let name = batch.name_any();
    let team = batch.namespace().unwrap_or_default();
    let status = batch.status.clone().unwrap_or_default();

    let start_time = status.start_time.as_ref().map(|t| t.0);
    let completion_time = status.completion_time.as_ref().map(|t| t.0);
    let failure = failed_condition(&status);
    let failed = failure.is_some();

    let duration = match (start_time, completion_time, failure) {
        (None, _, _) => chrono::TimeDelta::zero(),
        (Some(start), Some(end), _) => end - start,
        (Some(start), None, None) => now - start,
        (Some(start), None, Some(failure)) => failure
            .last_transition_time
            .as_ref()
            .map_or(chrono::TimeDelta::zero(), |at| at.0 - start),
    };

    let image = batch
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .and_then(|s| s.containers.first())
        .and_then(|c| c.image.clone())
        .unwrap_or_default();

    Run {
        id: Ident::run(environment, &team, &name),
        message: message(batch, &status, failed),
        pod_names,
        start_time,
        completion_time,
        failed,
        duration: duration.to_std().unwrap_or_default(),
        image,
        environment: environment.to_string(),
        job: job.to_string(),
        name,
        team,
    }
}

fn failed_condition(status: &JobStatus) -> Option<&JobCondition> {
    status
        .conditions
        .iter()
        .flatten()
        .find(|c| c.type_ == "Failed" && c.status == "True")
}

/// The number of successful completions the job is aiming for.
fn completion_target(batch: &Job) -> i32 {
    let spec = batch.spec.as_ref();
    spec.and_then(|s| s.completions)
        .or_else(|| spec.and_then(|s| s.parallelism))
        .unwrap_or(1)
}

fn message(batch: &Job, status: &JobStatus, failed: bool) -> String {
    let failures = status.failed.unwrap_or_default();
    if failed {
        return format!("Run failed after {failures} attempts");
    }

    let target = completion_target(batch);
    let active = status.active.unwrap_or_default();
    let succeeded = status.succeeded.unwrap_or_default();
    let attempts = if failures == 1 { "attempt" } else { "attempts" };

    if active > 0 {
        let running = if active == 1 {
            "1 instance running".to_string()
        } else {
            format!("{active} instances running")
        };
        return format!("{running}. {succeeded}/{target} completed ({failures} failed {attempts})");
    }
    if succeeded == target {
        return format!("{succeeded}/{target} instances completed ({failures} failed {attempts})");
    }
    String::new()
}
