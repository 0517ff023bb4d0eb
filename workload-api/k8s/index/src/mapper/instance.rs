use workload_api_core::{Ident, Instance, InstanceState};
use workload_api_k8s_api::{ContainerStatus, Pod, ResourceExt};

/// Maps a pod labeled `app=<name>` to an instance of that application.
///
/// The state and message are taken from the container named like the application.
pub fn to_instance(pod: &Pod, environment: &str) -> Instance {
    let app = pod.labels().get("app").cloned().unwrap_or_default();

    let image = pod
        .spec
        .iter()
        .flat_map(|s| s.containers.iter())
        .filter(|c| c.name == app)
        .find_map(|c| c.image.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let status = pod
        .status
        .iter()
        .flat_map(|s| s.container_statuses.iter().flatten())
        .find(|cs| cs.name == app);

    Instance {
        id: Ident::instance(pod.uid().as_deref().unwrap_or(&pod.name_any())),
        name: pod.name_any(),
        image,
        restarts: status.map(|cs| cs.restart_count).unwrap_or_default(),
        message: message(status).to_string(),
        state: state(status),
        created: pod.metadata.creation_timestamp.as_ref().map(|t| t.0),
        environment: environment.to_string(),
        team: pod.namespace().unwrap_or_default(),
        app,
    }
}

fn state(status: Option<&ContainerStatus>) -> InstanceState {
    let Some(state) = status.and_then(|cs| cs.state.as_ref()) else {
        return InstanceState::Unknown;
    };
    if state.running.is_some() {
        InstanceState::Running
    } else if state.waiting.is_some() {
        InstanceState::Failing
    } else {
        InstanceState::Unknown
    }
}

fn message(status: Option<&ContainerStatus>) -> &'static str {
    let reason = status
        .and_then(|cs| cs.state.as_ref())
        .and_then(|s| s.waiting.as_ref())
        .and_then(|w| w.reason.as_deref());
    match reason {
        Some("CrashLoopBackOff") => "Process is crashing, check logs",
        Some("ErrImagePull" | "ImagePullBackOff") => "Unable to pull image",
        Some("CreateContainerConfigError") => "Invalid instance configuration, check logs",
        _ => "",
    }
}
