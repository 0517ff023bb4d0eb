//! Conversions from cluster resources to the workload model.
//!
//! Untyped resources are decoded in one step per kind; a failure yields a [`ConversionError`]
//! naming what was being converted, and no partially-built value.

mod instance;
mod persistence;
mod run;
mod workload;


pub use self::{
    instance::to_instance,
    persistence::{
        sql_database_instance, to_bigquery_dataset, to_bucket, to_kafka_topic, to_sql_instance,
        to_valkey,
    },
    run::to_run,
    workload::{to_app, to_job, Mapped},
};
use workload_api_core::ConversionError;
use workload_api_k8s_api::{decode_field, DynamicObject};

fn decode<T>(obj: &DynamicObject, field: &str, kind: &'static str) -> Result<T, ConversionError>
where
    T: serde::de::DeserializeOwned + Default,
{
    decode_field(obj, field).map_err(|e| ConversionError::new(kind, e))
}
