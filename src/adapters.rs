//! Adapters translating one source format into node and edge records, plus the type
//! catalogs the graph schema is inferred from.

mod knowledge_graph;
mod stix;

pub use knowledge_graph::KnowledgeGraphAdapter;
pub use stix::StixAdapter;

use crate::{
    dataset::AdapterKind,
    loader::EdgeLoadMode,
    record::{EdgeRecord, NodeRecord},
    sampler::EndpointRule,
    schema::{RelationDeclaration, RelationNaming, TypeDeclaration},
    IngestResult,
};

/// Records of one dataset, before or after sampling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRecords {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    /// every relation label the source declares, whether or not it is used
    pub relation_labels: Vec<String>,
}

pub trait DatasetAdapter: std::fmt::Debug {
    fn kind(&self) -> AdapterKind;

    /// Parses the whole source. Fails with `InvalidSource` on malformed input.
    fn load(&self) -> IngestResult<LoadedRecords>;

    /// Declared property schemas of the node types to create for `records`.
    fn type_catalog(&self, records: &LoadedRecords) -> Vec<TypeDeclaration>;

    /// Relation tables to create for `records`.
    fn relation_catalog(&self, records: &LoadedRecords) -> Vec<RelationDeclaration>;

    /// Endpoints an edge must keep through sampling.
    fn endpoint_rule(&self) -> EndpointRule;

    fn relation_naming(&self) -> RelationNaming;

    fn edge_load_mode(&self) -> EdgeLoadMode;
}
