pub mod adapters;
mod config;
pub mod dataset;
mod error;
pub mod infra;
mod ingestion;
pub mod loader;
pub mod normalize;
pub mod record;
pub mod sampler;
pub mod schema;

// re-export commonly used items to alleviate user import burden only
pub use adapters::{DatasetAdapter, KnowledgeGraphAdapter, LoadedRecords, StixAdapter};
pub use config::{DanglingReferencePolicy, IngestConfig};
pub use dataset::{
    AdapterKind, AvailableKgDataset, Dataset, DatasetCreate, DatasetSpecification, DatasetSplit,
    KnowledgeGraphSpecification, SamplingPolicy, StixSpecification,
};
pub use error::IngestError;
pub use infra::{
    connectors::{EmbeddedGraphDatabase, EmbeddedGraphStore},
    pi::{GraphConnection, GraphDatabase, Statement, StoreError},
};
pub use ingestion::{build_adapter, create_dataset, instantiate_dataset};
pub use loader::{BulkGraphLoader, EdgeLoadMode, IngestionReport, LoadPlan};
pub use record::{EdgeRecord, NodeKey, NodeRecord, RecordFrame, Value};

/// Result of every fallible ingestion step
pub type IngestResult<T> = Result<T, IngestError>;
