#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use workload_api_core as core;
pub use workload_api_k8s_api as k8s;
pub use workload_api_k8s_index as index;

mod args;
mod clusters;
mod directory;
mod impersonate;
mod watches;

pub use self::{
    args::{Args, Services},
    clusters::{ClusterConfig, InvalidStaticCluster, StaticCluster},
    directory::StaticDirectory,
    impersonate::{Impersonator, WriteError},
};
