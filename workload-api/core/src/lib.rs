#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod access_policy;
mod conversion;
pub mod directory;
mod ident;
pub mod instance;
pub mod persistence;
pub mod run;
pub mod status;
pub mod workload;

pub use self::{
    access_policy::{AccessPolicy, MutualExplanation, Rule},
    conversion::ConversionError,
    directory::{Actor, TeamDirectory, UserTeam},
    ident::Ident,
    instance::{Instance, InstanceState},
    persistence::Persistence,
    run::Run,
    status::{ErrorLevel, State, StateError, StateErrorKind, Status},
    workload::{Workload, WorkloadKind},
};

/// The registry host that workload images are expected to be pulled from.
pub const CANONICAL_REGISTRY: &str = "europe-north1-docker.pkg.dev";
