//! Dataset metadata produced by an ingestion, and the request that creates it.

mod sampling_policy;
mod specification;

pub use sampling_policy::SamplingPolicy;
pub use specification::{
    AdapterKind, AvailableKgDataset, DatasetSpecification, DatasetSplit,
    KnowledgeGraphSpecification, StixSpecification,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{normalize::slugify, IngestResult};

/// Instructions to create a new dataset.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DatasetCreate {
    pub name: String,
    pub specification: DatasetSpecification,
    #[serde(default)]
    pub sampling: Option<SamplingPolicy>,
}

/// The persisted record of one dataset and its backing graph store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub store_path: PathBuf,
    pub specification_kind: AdapterKind,
    pub specification_value: String,
    pub sampling_ratio: Option<f64>,
    pub sampling_count: Option<usize>,
}

impl Dataset {
    /// Builds the metadata record of `create`, assigning a fresh backing store path under
    /// `datasets_dir`.
    pub fn prepare(create: &DatasetCreate, datasets_dir: &Path) -> IngestResult<Self> {
        let sampling = create.sampling.unwrap_or_default();
        sampling.validate()?;
        Ok(Self {
            name: create.name.clone(),
            store_path: unique_store_path(datasets_dir, &create.name, Utc::now()),
            specification_kind: create.specification.kind(),
            specification_value: create.specification.to_json()?,
            sampling_ratio: sampling.ratio(),
            sampling_count: sampling.count(),
        })
    }

    pub fn sampling_policy(&self) -> IngestResult<SamplingPolicy> {
        SamplingPolicy::from_fields(self.sampling_count, self.sampling_ratio)
    }

    pub fn specification(&self) -> IngestResult<DatasetSpecification> {
        DatasetSpecification::from_json(&self.specification_value)
    }
}

/// `<datasets_dir>/<timestamp>_<slug>`, suffixed with a counter if that path is taken.
pub(crate) fn unique_store_path(datasets_dir: &Path, name: &str, now: DateTime<Utc>) -> PathBuf {
    let base = format!("{}_{}", now.format("%Y-%m-%d_%H-%M-%S%.6f"), slugify(name));
    let mut path = datasets_dir.join(&base);
    let mut suffix = 1;
    while path.exists() {
        path = datasets_dir.join(format!("{base}_{suffix}"));
        suffix += 1;
    }
    path
}
