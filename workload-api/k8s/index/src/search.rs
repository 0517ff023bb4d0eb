use crate::{mapper, Environments, Error};
use ahash::AHashMap as HashMap;
use workload_api_core::{TeamDirectory, Workload, WorkloadKind};
use workload_api_k8s_api::ResourceExt;

/// A workload whose name matched a search query.
///
/// Lower ranks are better matches. Hit workloads are decoded but not resolved: their access rules
/// are unverified and their status is the default.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchHit {
    pub workload: Workload,
    pub rank: u8,
}

impl Environments {
    /// Finds applications and jobs in every environment whose name matches `query`.
    ///
    /// Workloads owned by teams that the directory does not know (or cannot answer for) are
    /// omitted. Hits are ordered by rank, name and environment.
    pub async fn search(
        &self,
        query: &str,
        kind: Option<WorkloadKind>,
        directory: &dyn TeamDirectory,
    ) -> Result<Vec<SearchHit>, Error> {
        let query = query.to_lowercase();
        let mut candidates = Vec::new();

        for cluster in self.clusters() {
            let environment = cluster.name();
            for (workload_kind, store) in [
                (WorkloadKind::App, cluster.apps()),
                (WorkloadKind::Job, cluster.naisjobs()),
            ] {
                if kind.is_some_and(|k| k != workload_kind) {
                    continue;
                }
                for obj in store.list_all() {
                    let name = obj.name_any();
                    let Some(rank) = rank(&query, &name) else {
                        continue;
                    };
                    let team = obj.namespace().unwrap_or_default();
                    let mapped = match workload_kind {
                        WorkloadKind::App => mapper::to_app(&obj, environment),
                        WorkloadKind::Job => mapper::to_job(&obj, environment),
                    }
                    .map_err(Error::conversion(environment, &team, &name))?;
                    candidates.push(SearchHit {
                        workload: mapped.workload,
                        rank,
                    });
                }
            }
        }

        let mut known = HashMap::<String, bool>::default();
        let mut hits = Vec::with_capacity(candidates.len());
        for hit in candidates {
            let team = &hit.workload.team;
            let exists = match known.get(team) {
                Some(exists) => *exists,
                None => {
                    let exists = match directory.team_exists(team).await {
                        Ok(exists) => exists,
                        Err(error) => {
                            tracing::debug!(%team, %error, "Failed to look up team");
                            false
                        }
                    };
                    known.insert(team.clone(), exists);
                    exists
                }
            };
            if exists {
                hits.push(hit);
            }
        }

        hits.sort_by(|a, b| {
            (a.rank, &a.workload.name, &a.workload.environment).cmp(&(
                b.rank,
                &b.workload.name,
                &b.workload.environment,
            ))
        });
        Ok(hits)
    }
}

/// Ranks `name` against an already lowercased query: 0 for an exact match, 1 for a prefix and 2
/// for a substring. An empty query matches nothing.
fn rank(query: &str, name: &str) -> Option<u8> {
    if query.is_empty() {
        return None;
    }
    let name = name.to_lowercase();
    if name == query {
        Some(0)
    } else if name.starts_with(query) {
        Some(1)
    } else if name.contains(query) {
        Some(2)
    } else {
        None
    }
}
