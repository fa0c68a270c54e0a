use log::info;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use super::{DatasetAdapter, LoadedRecords};
use crate::{
    dataset::{AdapterKind, DatasetSplit, KnowledgeGraphSpecification},
    loader::EdgeLoadMode,
    record::{EdgeRecord, NodeKey, NodeRecord, Value},
    sampler::EndpointRule,
    schema::{
        PropertyDeclaration, PropertyKind, RelationDeclaration, RelationNaming, TypeDeclaration,
        PRIMARY_KEY,
    },
    IngestError, IngestResult,
};

/// Every entity of a knowledge graph lives in this single node table.
pub const NODE_TYPE: &str = "Node";
const LABEL: &str = "label";
const ENTITIES_FILE: &str = "entities.dict";
const RELATIONS_FILE: &str = "relations.dict";

/// Reads a benchmark knowledge graph laid out as `entities.dict`, `relations.dict` and
/// tab-separated triple files of labels.
#[derive(Debug, Clone)]
pub struct KnowledgeGraphAdapter {
    dataset_dir: PathBuf,
    splits: Vec<DatasetSplit>,
}

fn tsv_reader(path: &Path) -> IngestResult<csv::Reader<std::fs::File>> {
    if !path.is_file() {
        return Err(IngestError::InvalidSource(format!(
            "missing dataset file {}",
            path.display()
        )));
    }
    Ok(csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_path(path)?)
}

/// `id<TAB>label` lines.
fn read_dict(path: &Path) -> IngestResult<Vec<(i32, String)>> {
    let mut entries = Vec::new();
    for (line, record) in tsv_reader(path)?.records().enumerate() {
        let record = record?;
        let (Some(id), Some(label), 2) = (record.get(0), record.get(1), record.len()) else {
            return Err(IngestError::InvalidSource(format!(
                "{}:{}: expected `id<TAB>label`",
                path.display(),
                line + 1
            )));
        };
        let id = id.trim().parse::<i32>().map_err(|e| {
            IngestError::InvalidSource(format!("{}:{}: {e}", path.display(), line + 1))
        })?;
        entries.push((id, label.to_string()));
    }
    Ok(entries)
}

impl KnowledgeGraphAdapter {
    pub fn new(kg_datasets_dir: &Path, spec: &KnowledgeGraphSpecification) -> IngestResult<Self> {
        let mut splits = spec.splits.clone();
        if splits.is_empty() {
            splits.push(DatasetSplit::Train);
        }
        splits.sort();
        splits.dedup();
        Ok(Self {
            dataset_dir: kg_datasets_dir.join(spec.initial_dataset.directory()?),
            splits,
        })
    }

    fn read_triples(
        &self,
        split: DatasetSplit,
        entities: &HashMap<&str, i32>,
        relations: &HashMap<&str, i32>,
        edges: &mut Vec<EdgeRecord>,
    ) -> IngestResult<()> {
        let path = self.dataset_dir.join(split.file_name());
        let before = edges.len();
        for (line, record) in tsv_reader(&path)?.records().enumerate() {
            let record = record?;
            let malformed = |reason: String| {
                IngestError::InvalidSource(format!("{}:{}: {reason}", path.display(), line + 1))
            };
            if record.len() != 3 {
                return Err(malformed("expected `head<TAB>relation<TAB>tail`".to_string()));
            }
            let entity = |label: &str| {
                entities
                    .get(label)
                    .map(|id| NodeKey::Int(*id))
                    .ok_or_else(|| malformed(format!("unknown entity `{label}`")))
            };
            let source = entity(&record[0])?;
            let target = entity(&record[2])?;
            if !relations.contains_key(&record[1]) {
                return Err(malformed(format!("unknown relation `{}`", &record[1])));
            }
            edges.push(EdgeRecord {
                source,
                target,
                label: record[1].to_string(),
                properties: Default::default(),
                source_type: NODE_TYPE.to_string(),
                target_type: NODE_TYPE.to_string(),
            });
        }
        info!("Read {} triples from {}", edges.len() - before, path.display());
        Ok(())
    }
}

impl DatasetAdapter for KnowledgeGraphAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::KnowledgeGraph
    }

    fn load(&self) -> IngestResult<LoadedRecords> {
        let entities = read_dict(&self.dataset_dir.join(ENTITIES_FILE))?;
        let relations = read_dict(&self.dataset_dir.join(RELATIONS_FILE))?;
        info!(
            "Knowledge graph {} declares {} entities and {} relations",
            self.dataset_dir.display(),
            entities.len(),
            relations.len()
        );

        let entity_ids: HashMap<&str, i32> =
            entities.iter().map(|(id, l)| (l.as_str(), *id)).collect();
        let relation_ids: HashMap<&str, i32> =
            relations.iter().map(|(id, l)| (l.as_str(), *id)).collect();
        let mut edges = Vec::new();
        for split in &self.splits {
            self.read_triples(*split, &entity_ids, &relation_ids, &mut edges)?;
        }

        let nodes = entities
            .iter()
            .map(|(id, label)| {
                NodeRecord::new(NODE_TYPE, NodeKey::Int(*id))
                    .with_property(LABEL, Value::String(label.clone()))
            })
            .collect();
        Ok(LoadedRecords {
            nodes,
            edges,
            relation_labels: relations.into_iter().map(|(_, label)| label).collect(),
        })
    }

    fn type_catalog(&self, _records: &LoadedRecords) -> Vec<TypeDeclaration> {
        vec![TypeDeclaration {
            type_tag: NODE_TYPE.to_string(),
            properties: vec![
                PropertyDeclaration::new(PRIMARY_KEY, PropertyKind::Integer),
                PropertyDeclaration::new(LABEL, PropertyKind::String),
            ],
        }]
    }

    /// One relation table per declared relation, used or not.
    fn relation_catalog(&self, records: &LoadedRecords) -> Vec<RelationDeclaration> {
        records
            .relation_labels
            .iter()
            .map(|label| RelationDeclaration {
                label: label.clone(),
                source_tag: NODE_TYPE.to_string(),
                target_tag: NODE_TYPE.to_string(),
                properties: vec![],
            })
            .collect()
    }

    fn endpoint_rule(&self) -> EndpointRule {
        EndpointRule::AtLeastOne
    }

    fn relation_naming(&self) -> RelationNaming {
        RelationNaming::Label
    }

    fn edge_load_mode(&self) -> EdgeLoadMode {
        EdgeLoadMode::MatchCreate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AvailableKgDataset;
    use std::fs;

    fn write_dataset(root: &Path) {
        let dir = root.join("FB15k");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(ENTITIES_FILE),
            "0\t/m/027rn\n1\t/m/06cx9\n2\t/m/017dcd\n3\t/m/06v8s0\n",
        )
        .unwrap();
        fs::write(
            dir.join(RELATIONS_FILE),
            "0\t/location/country/form_of_government\n1\t/film/film/genre\n",
        )
        .unwrap();
        fs::write(
            dir.join("train.txt"),
            "/m/027rn\t/location/country/form_of_government\t/m/06cx9\n/m/017dcd\t/film/film/genre\t/m/06v8s0\n",
        )
        .unwrap();
        fs::write(dir.join("test.txt"), "/m/06v8s0\t/film/film/genre\t/m/027rn\n").unwrap();
    }

    fn adapter(root: &Path, splits: Vec<DatasetSplit>) -> KnowledgeGraphAdapter {
        KnowledgeGraphAdapter::new(
            root,
            &KnowledgeGraphSpecification {
                initial_dataset: AvailableKgDataset::FB15k,
                splits,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_load_entities_and_triples() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let records = adapter(dir.path(), vec![DatasetSplit::Train]).load().unwrap();

        assert_eq!(records.nodes.len(), 4);
        assert_eq!(
            records.nodes[2].get("label"),
            &Value::String("/m/017dcd".to_string())
        );
        assert_eq!(records.edges.len(), 2);
        assert_eq!(records.edges[1].source, NodeKey::Int(2));
        assert_eq!(records.edges[1].target, NodeKey::Int(3));
        assert_eq!(records.edges[1].label, "/film/film/genre");
        assert_eq!(records.relation_labels.len(), 2);
    }

    #[test]
    fn test_splits_are_read_in_canonical_order() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let records = adapter(dir.path(), vec![DatasetSplit::Test, DatasetSplit::Train])
            .load()
            .unwrap();
        assert_eq!(records.edges.len(), 3);
        assert_eq!(records.edges[2].source, NodeKey::Int(3));
    }

    #[test]
    fn test_unknown_entity_is_invalid_source() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        fs::write(
            dir.path().join("FB15k").join("train.txt"),
            "/m/027rn\t/film/film/genre\t/m/nowhere\n",
        )
        .unwrap();
        let err = adapter(dir.path(), vec![]).load().unwrap_err();
        assert!(matches!(err, IngestError::InvalidSource(_)), "{err}");
        assert!(err.to_string().contains("/m/nowhere"));
    }

    #[test]
    fn test_missing_split_file() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let err = adapter(dir.path(), vec![DatasetSplit::Validation])
            .load()
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidSource(_)));
    }

    #[test]
    fn test_unsupported_initial_dataset() {
        let err = KnowledgeGraphAdapter::new(
            Path::new("."),
            &KnowledgeGraphSpecification {
                initial_dataset: AvailableKgDataset::Other,
                splits: vec![],
            },
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedSpecification(_)));
    }

    #[test]
    fn test_catalogs_cover_every_relation() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let kg = adapter(dir.path(), vec![]);
        let records = kg.load().unwrap();
        let relations = kg.relation_catalog(&LoadedRecords {
            edges: vec![],
            ..records.clone()
        });
        assert_eq!(relations.len(), 2);
        assert_eq!(kg.type_catalog(&records)[0].type_tag, NODE_TYPE);
    }
}
