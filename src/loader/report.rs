use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// What an ingestion committed to its store.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct IngestionReport {
    pub store_path: PathBuf,
    /// loaded nodes by node table name
    pub node_counts: BTreeMap<String, usize>,
    /// created edges by relation table name
    pub edge_counts: BTreeMap<String, usize>,
    /// edges skipped because an endpoint is not among the loaded nodes
    pub dangling_edges: usize,
    /// statements executed, schema definitions included
    pub statements: usize,
    /// size of every edge statement, in issue order
    pub edge_batches: Vec<usize>,
}

impl IngestionReport {
    pub(super) fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            ..Default::default()
        }
    }

    pub fn total_nodes(&self) -> usize {
        self.node_counts.values().sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edge_counts.values().sum()
    }
}
