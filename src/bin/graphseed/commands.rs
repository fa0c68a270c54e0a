use serde_json::json;
use std::{collections::BTreeMap, path::Path};

use graphseed::{
    create_dataset, DatasetCreate, DatasetSpecification, EmbeddedGraphDatabase,
    EmbeddedGraphStore, IngestConfig, IngestError, IngestResult, KnowledgeGraphSpecification,
    SamplingPolicy, StixSpecification,
};

use crate::CreateArgs;

fn specification(args: &CreateArgs) -> IngestResult<DatasetSpecification> {
    match (&args.kg, &args.stix) {
        (Some(initial_dataset), None) => Ok(DatasetSpecification::KnowledgeGraph(
            KnowledgeGraphSpecification {
                initial_dataset: *initial_dataset,
                splits: args.splits.clone(),
            },
        )),
        (None, Some(file)) => Ok(DatasetSpecification::Stix(StixSpecification {
            file_content: std::fs::read_to_string(file)?,
        })),
        _ => Err(IngestError::UnsupportedSpecification(
            "exactly one of --kg and --stix is required".to_string(),
        )),
    }
}

/// Prints `{"dataset": ..., "report": ...}` once the store is committed.
pub(crate) fn create(args: CreateArgs) -> IngestResult<String> {
    let config = IngestConfig::init(args.home.as_deref())?;
    let create = DatasetCreate {
        name: args.name.clone(),
        specification: specification(&args)?,
        sampling: Some(SamplingPolicy::from_fields(args.count, args.ratio)?),
    };
    let (dataset, report) = create_dataset(&create, &EmbeddedGraphDatabase, &config)?;
    Ok(serde_json::to_string_pretty(&json!({
        "dataset": dataset,
        "report": report,
    }))?)
}

pub(crate) fn inspect(path: &Path) -> IngestResult<String> {
    let store = EmbeddedGraphStore::open(path)?;
    let node_tables: BTreeMap<&str, usize> = store
        .node_tables()
        .map(|t| (t.name.as_str(), store.node_count(&t.name).unwrap_or_default()))
        .collect();
    let rel_tables: BTreeMap<&str, _> = store
        .rel_tables()
        .map(|t| {
            (
                t.name.as_str(),
                json!({
                    "from": t.from,
                    "to": t.to,
                    "edges": store.edge_count(&t.name).unwrap_or_default(),
                }),
            )
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json!({
        "store_path": store.path(),
        "nodes": store.total_nodes(),
        "edges": store.total_edges(),
        "node_tables": node_tables,
        "rel_tables": rel_tables,
    }))?)
}
