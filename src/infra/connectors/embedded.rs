mod tables;

use log::debug;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    infra::pi::{GraphConnection, GraphDatabase, Statement, StatementSummary, StoreError},
    record::{NodeKey, Value},
    schema::{NodeTableDef, RelTableDef},
};
use tables::GraphSnapshot;

/// File holding the catalog and data of an embedded store, inside the store directory.
pub const SNAPSHOT_FILE: &str = "graph.json";

/// Embedded graph database: every store is a directory on the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedGraphDatabase;

impl GraphDatabase for EmbeddedGraphDatabase {
    fn create(&self, path: &Path) -> Result<Box<dyn GraphConnection>, StoreError> {
        Ok(Box::new(EmbeddedGraphStore::create(path)?))
    }
}

/// One store instance. Statements apply in memory, a checkpoint writes them to disk.
#[derive(Debug)]
pub struct EmbeddedGraphStore {
    path: PathBuf,
    snapshot: GraphSnapshot,
}

impl EmbeddedGraphStore {
    /// Creates a new empty store. Fails if anything already exists at `path`.
    pub fn create(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        fs::create_dir_all(path)?;
        let store = Self {
            path: path.to_path_buf(),
            snapshot: GraphSnapshot::default(),
        };
        store.persist()?;
        Ok(store)
    }

    /// Opens an existing store in its last checkpointed state.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = path.join(SNAPSHOT_FILE);
        if !file.is_file() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let mut snapshot: GraphSnapshot = serde_json::from_reader(BufReader::new(File::open(file)?))?;
        for table in snapshot.node_tables.values_mut() {
            table.rebuild_index()?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            snapshot,
        })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let staging = self.path.join(format!("{SNAPSHOT_FILE}.tmp"));
        let mut writer = BufWriter::new(File::create(&staging)?);
        serde_json::to_writer(&mut writer, &self.snapshot)?;
        writer.flush()?;
        fs::rename(staging, self.path.join(SNAPSHOT_FILE))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node_tables(&self) -> impl Iterator<Item = &NodeTableDef> {
        self.snapshot.node_tables.values().map(|t| &t.def)
    }

    pub fn rel_tables(&self) -> impl Iterator<Item = &RelTableDef> {
        self.snapshot.rel_tables.values().map(|t| &t.def)
    }

    pub fn node_count(&self, table: &str) -> Option<usize> {
        self.snapshot.node_tables.get(table).map(|t| t.rows.len())
    }

    pub fn edge_count(&self, table: &str) -> Option<usize> {
        self.snapshot.rel_tables.get(table).map(|t| t.edges.len())
    }

    pub fn total_nodes(&self) -> usize {
        self.snapshot.node_tables.values().map(|t| t.rows.len()).sum()
    }

    pub fn total_edges(&self) -> usize {
        self.snapshot.rel_tables.values().map(|t| t.edges.len()).sum()
    }

    /// Non-null properties of a node, by column name.
    pub fn node(&self, table: &str, key: &NodeKey) -> Option<BTreeMap<String, Value>> {
        let node_table = self.snapshot.node_tables.get(table)?;
        let row = node_table.get(key)?;
        Some(
            node_table
                .def
                .columns
                .iter()
                .zip(row)
                .filter(|(_, value)| !value.is_null())
                .map(|(column, value)| (column.name.clone(), value.clone()))
                .collect(),
        )
    }

    /// Endpoint keys of every edge of a relation table, in insertion order.
    pub fn edges(&self, table: &str) -> Option<Vec<(NodeKey, NodeKey)>> {
        self.snapshot
            .rel_tables
            .get(table)
            .map(|t| t.edges.iter().map(|e| (e.from.clone(), e.to.clone())).collect())
    }
}

impl GraphConnection for EmbeddedGraphStore {
    fn execute(&mut self, statement: &Statement) -> Result<StatementSummary, StoreError> {
        debug!("{} <- {}", self.path.display(), statement);
        self.snapshot.apply(statement)
    }

    fn checkpoint(&mut self) -> Result<(), StoreError> {
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        infra::pi::{EdgeCreation, MatchCreate, NodeBinding},
        record::RecordFrame,
        schema::{ColumnDef, ColumnType},
    };

    fn node_table() -> NodeTableDef {
        NodeTableDef {
            name: "Node".to_string(),
            columns: vec![
                ColumnDef::new("id", ColumnType::Int32),
                ColumnDef::new("label", ColumnType::String),
            ],
            primary_key: "id".to_string(),
        }
    }

    fn rel_table(name: &str) -> RelTableDef {
        RelTableDef {
            name: name.to_string(),
            label: name.to_lowercase(),
            from: "Node".to_string(),
            to: "Node".to_string(),
            columns: vec![],
        }
    }

    fn load_nodes(ids: &[i32]) -> Statement {
        let mut frame = RecordFrame::new(node_table().columns);
        for id in ids {
            frame.push(vec![Value::Int32(*id), Value::String(format!("/m/{id}"))]);
        }
        Statement::LoadNodes {
            table: "Node".to_string(),
            frame,
        }
    }

    fn binding(id: i32) -> NodeBinding {
        NodeBinding {
            table: "Node".to_string(),
            key_column: "id".to_string(),
            key: NodeKey::Int(id),
        }
    }

    fn populated_store(dir: &Path) -> EmbeddedGraphStore {
        let mut store = EmbeddedGraphStore::create(&dir.join("store")).unwrap();
        store
            .execute(&Statement::CreateNodeTable(node_table()))
            .unwrap();
        store
            .execute(&Statement::CreateRelTable(rel_table("Likes")))
            .unwrap();
        store.execute(&load_nodes(&[1, 2, 3])).unwrap();
        store
    }

    #[test]
    fn test_create_refuses_existing_path() {
        let dir = tempfile::tempdir().unwrap();
        let res = EmbeddedGraphStore::create(dir.path());
        assert!(matches!(res, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn test_load_and_connect_nodes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = populated_store(dir.path());

        let summary = store
            .execute(&Statement::MatchCreate(MatchCreate {
                bindings: vec![binding(1), binding(2)],
                edges: vec![EdgeCreation {
                    source: 0,
                    rel_table: "Likes".to_string(),
                    target: 1,
                }],
            }))
            .unwrap();
        assert_eq!(summary.rows_affected, 1);

        let mut frame = RecordFrame::new(vec![
            ColumnDef::new("from", ColumnType::Int32),
            ColumnDef::new("to", ColumnType::Int32),
        ]);
        frame.push(vec![Value::Int32(3), Value::Int32(1)]);
        store
            .execute(&Statement::CopyRel {
                table: "Likes".to_string(),
                frame,
            })
            .unwrap();

        assert_eq!(store.node_count("Node"), Some(3));
        assert_eq!(
            store.edges("Likes").unwrap(),
            vec![
                (NodeKey::Int(1), NodeKey::Int(2)),
                (NodeKey::Int(3), NodeKey::Int(1))
            ]
        );
        let node = store.node("Node", &NodeKey::Int(2)).unwrap();
        assert_eq!(node["label"], Value::String("/m/2".to_string()));
    }

    #[test]
    fn test_match_on_missing_node_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = populated_store(dir.path());

        let res = store.execute(&Statement::MatchCreate(MatchCreate {
            bindings: vec![binding(1), binding(2), binding(42)],
            edges: vec![
                EdgeCreation {
                    source: 0,
                    rel_table: "Likes".to_string(),
                    target: 1,
                },
                EdgeCreation {
                    source: 1,
                    rel_table: "Likes".to_string(),
                    target: 2,
                },
            ],
        }));
        assert!(matches!(res, Err(StoreError::MissingNode { .. })));
        assert_eq!(store.edge_count("Likes"), Some(0));
    }

    #[test]
    fn test_load_rejects_duplicate_key_and_bad_type() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = populated_store(dir.path());

        let res = store.execute(&load_nodes(&[4, 1]));
        assert!(matches!(res, Err(StoreError::DuplicatePrimaryKey { .. })));
        assert_eq!(store.node_count("Node"), Some(3));

        let mut frame = RecordFrame::new(node_table().columns);
        frame.push(vec![Value::Int32(5), Value::Boolean(true)]);
        let res = store.execute(&Statement::LoadNodes {
            table: "Node".to_string(),
            frame,
        });
        assert!(matches!(res, Err(StoreError::TypeMismatch { .. })));
    }

    #[test]
    fn test_schema_statements_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = populated_store(dir.path());

        let res = store.execute(&Statement::CreateNodeTable(node_table()));
        assert!(matches!(res, Err(StoreError::TableExists(_))));

        let mut bad = node_table();
        bad.name = "threat-actor".to_string();
        let res = store.execute(&Statement::CreateNodeTable(bad));
        assert!(matches!(res, Err(StoreError::MalformedStatement(_))));

        let mut dangling = rel_table("Knows");
        dangling.to = "Person".to_string();
        let res = store.execute(&Statement::CreateRelTable(dangling));
        assert!(matches!(res, Err(StoreError::UnknownTable(_))));
    }

    #[test]
    fn test_reopen_after_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = populated_store(dir.path());
        store.checkpoint().unwrap();

        let reopened = EmbeddedGraphStore::open(store.path()).unwrap();
        assert_eq!(reopened.total_nodes(), 3);
        assert_eq!(reopened.total_edges(), 0);
        assert!(reopened.node("Node", &NodeKey::Int(3)).is_some());
        assert_eq!(
            reopened.rel_tables().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["Likes"]
        );
    }
}
