use std::{error::Error, path::PathBuf};

use crate::infra::pi::StoreError;

/// Every fatal condition of an ingestion. None of them is recovered locally: the ingestion
/// stops and the backing store path must not be reused.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("Path specified for the graph store already exists: {}. Abort store creation.", path.display())]
    TargetAlreadyExists { path: PathBuf },

    #[error("Specification not supported: {0}")]
    UnsupportedSpecification(String),

    #[error("Schema definition failed for {target}.\nOriginal error: {super_error}")]
    SchemaDefinitionFailure {
        target: String,
        super_error: Box<dyn Error + Send + Sync>,
    },

    #[error("Data load failed for {target}.\nOriginal error: {super_error}")]
    DataLoadFailure {
        target: String,
        super_error: Box<dyn Error + Send + Sync>,
    },

    #[error("Invalid sampling policy: {0}")]
    InvalidSampling(String),

    #[error("Invalid source data: {0}")]
    InvalidSource(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
