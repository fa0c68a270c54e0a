use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{IngestError, IngestResult};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdapterKind {
    KnowledgeGraph,
    Stix,
}

/// Knowledge-graph benchmark datasets known to the triple loader.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum AvailableKgDataset {
    #[serde(rename = "KGDatasetFB15k", alias = "FB15k")]
    #[strum(to_string = "KGDatasetFB15k", serialize = "FB15k")]
    FB15k,
    #[serde(rename = "other")]
    #[strum(to_string = "other")]
    Other,
}

impl AvailableKgDataset {
    /// Directory of the dataset under the knowledge-graph datasets root.
    pub fn directory(&self) -> IngestResult<&'static str> {
        match self {
            AvailableKgDataset::FB15k => Ok("FB15k"),
            AvailableKgDataset::Other => Err(IngestError::UnsupportedSpecification(format!(
                "no triple loader for knowledge-graph dataset `{self}`"
            ))),
        }
    }
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    #[strum(to_string = "validation", serialize = "valid")]
    Validation,
    Test,
}

impl DatasetSplit {
    pub fn file_name(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train.txt",
            DatasetSplit::Validation => "valid.txt",
            DatasetSplit::Test => "test.txt",
        }
    }
}

fn default_splits() -> Vec<DatasetSplit> {
    vec![DatasetSplit::Train]
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct KnowledgeGraphSpecification {
    pub initial_dataset: AvailableKgDataset,
    #[serde(default = "default_splits")]
    pub splits: Vec<DatasetSplit>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StixSpecification {
    /// raw bundle JSON, or a `data:` URL carrying it
    pub file_content: String,
}

/// Which adapter builds the dataset and from what.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetSpecification {
    KnowledgeGraph(KnowledgeGraphSpecification),
    Stix(StixSpecification),
}

impl DatasetSpecification {
    pub fn kind(&self) -> AdapterKind {
        match self {
            DatasetSpecification::KnowledgeGraph(_) => AdapterKind::KnowledgeGraph,
            DatasetSpecification::Stix(_) => AdapterKind::Stix,
        }
    }

    pub fn from_json(value: &str) -> IngestResult<Self> {
        serde_json::from_str(value).map_err(|e| IngestError::UnsupportedSpecification(e.to_string()))
    }

    pub fn to_json(&self) -> IngestResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
