#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod annotations;
pub mod labels;
pub mod nais;
pub mod persistence;
mod resource;
mod watch;

pub use self::{
    labels::{InvalidSelector, Selector},
    resource::Kind,
    watch::{Event, Watch},
};
pub use k8s_openapi::api::{
    apps::v1::Deployment,
    batch::v1::{Job, JobSpec, JobStatus},
    core::v1::{Container, ContainerStatus, Pod, PodSpec, PodStatus},
};
pub use kube::api::{ApiResource, DynamicObject, ObjectMeta, ResourceExt};

/// Decodes the `field` section (e.g. `spec` or `status`) of an untyped object.
///
/// A missing or null section decodes as the type's default.
pub fn decode_field<T>(obj: &DynamicObject, field: &str) -> serde_json::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match obj.data.get(field) {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => T::deserialize(value),
    }
}
