use crate::Ident;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// One execution of a job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Run {
    pub id: Ident,
    pub name: String,
    pub pod_names: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    pub failed: bool,
    pub duration: Duration,
    pub image: String,
    pub message: String,
    pub environment: String,
    pub team: String,
    pub job: String,
}

/// Orders runs most-recently-started first; runs that haven't started sort last.
pub fn sort_runs(runs: &mut [Run]) {
    runs.sort_by(|a, b| match (a.start_time, b.start_time) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Returns the run with the latest start time. Ties keep the earliest candidate.
pub fn most_recent(runs: &[Run]) -> Option<&Run> {
    let mut latest: Option<&Run> = None;
    for run in runs {
        let Some(started) = run.start_time else {
            continue;
        };
        match latest.and_then(|l| l.start_time) {
            Some(current) if started <= current => {}
            _ => latest = Some(run),
        }
    }
    latest
}
