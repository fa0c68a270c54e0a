use log::info;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    adapters::{DatasetAdapter, KnowledgeGraphAdapter, LoadedRecords, StixAdapter},
    config::IngestConfig,
    dataset::{Dataset, DatasetCreate, DatasetSpecification},
    infra::pi::GraphDatabase,
    loader::{BulkGraphLoader, IngestionReport, LoadPlan},
    sampler::{filter_edges, sample},
    schema::{infer_node_schema, infer_relation_schema},
    IngestError, IngestResult,
};

/// The adapter reading the source of `specification`.
pub fn build_adapter(
    specification: &DatasetSpecification,
    config: &IngestConfig,
) -> IngestResult<Box<dyn DatasetAdapter>> {
    let adapter: Box<dyn DatasetAdapter> = match specification {
        DatasetSpecification::KnowledgeGraph(spec) => Box::new(KnowledgeGraphAdapter::new(
            &config.kg_datasets_dir,
            spec,
        )?),
        DatasetSpecification::Stix(spec) => {
            Box::new(StixAdapter::new(spec, config.dangling_references))
        }
    };
    Ok(adapter)
}

fn sampling_rng(config: &IngestConfig) -> StdRng {
    match config.sampling_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Materializes `dataset` in a new store at its backing path.
///
/// Reads the source, samples its nodes, infers the schema of what is left and loads it. On
/// failure the backing path must not be reused.
pub fn instantiate_dataset(
    dataset: &Dataset,
    specification: &DatasetSpecification,
    database: &dyn GraphDatabase,
    config: &IngestConfig,
) -> IngestResult<IngestionReport> {
    let adapter = build_adapter(specification, config)?;
    let policy = dataset.sampling_policy()?;
    let loader = BulkGraphLoader::new(database, config.edge_batch_size)?;
    if dataset.store_path.exists() {
        return Err(IngestError::TargetAlreadyExists {
            path: dataset.store_path.clone(),
        });
    }

    info!(
        "Instantiating dataset `{}` from a {} source",
        dataset.name,
        adapter.kind()
    );
    let records = adapter.load()?;
    let mut rng = sampling_rng(config);
    let nodes = sample(records.nodes, &policy, &mut rng)?;
    let edges = filter_edges(records.edges, &nodes, adapter.endpoint_rule());
    let records = LoadedRecords {
        nodes,
        edges,
        relation_labels: records.relation_labels,
    };

    let node_tables = infer_node_schema(&adapter.type_catalog(&records))?;
    let rel_tables = infer_relation_schema(
        &adapter.relation_catalog(&records),
        &node_tables,
        adapter.relation_naming(),
    )?;
    info!(
        "Inferred {} node tables and {} relation tables",
        node_tables.len(),
        rel_tables.len()
    );

    let plan = LoadPlan {
        node_tables,
        rel_tables,
        nodes: records.nodes,
        edges: records.edges,
        edge_mode: adapter.edge_load_mode(),
    };
    loader.instantiate(&dataset.store_path, &plan)
}

/// Registers a new dataset under the configured datasets directory and instantiates it.
pub fn create_dataset(
    create: &DatasetCreate,
    database: &dyn GraphDatabase,
    config: &IngestConfig,
) -> IngestResult<(Dataset, IngestionReport)> {
    let dataset = Dataset::prepare(create, &config.datasets_dir)?;
    let report = instantiate_dataset(&dataset, &create.specification, database, config)?;
    info!(
        "Dataset `{}` committed to {}",
        dataset.name,
        dataset.store_path.display()
    );
    Ok((dataset, report))
}
