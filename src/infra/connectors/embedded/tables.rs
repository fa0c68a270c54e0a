use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    infra::pi::{MatchCreate, Statement, StatementSummary, StoreError},
    normalize::is_valid_identifier,
    record::{NodeKey, RecordFrame, Value},
    schema::{ColumnDef, ColumnType, NodeTableDef, RelTableDef},
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(super) struct NodeTable {
    pub(super) def: NodeTableDef,
    pub(super) rows: Vec<Vec<Value>>,
    #[serde(skip)]
    index: HashMap<NodeKey, usize>,
}

impl NodeTable {
    fn new(def: NodeTableDef) -> Self {
        Self {
            def,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn key_position(&self) -> usize {
        self.def
            .columns
            .iter()
            .position(|c| c.name == self.def.primary_key)
            .unwrap_or_default()
    }

    pub(super) fn rebuild_index(&mut self) -> Result<(), StoreError> {
        let key_position = self.key_position();
        self.index.clear();
        for (i, row) in self.rows.iter().enumerate() {
            let key = NodeKey::from_value(&row[key_position]).ok_or_else(|| {
                StoreError::MalformedStatement(format!("{} row {i} has no key", self.def.name))
            })?;
            self.index.insert(key, i);
        }
        Ok(())
    }

    pub(super) fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub(super) fn get(&self, key: &NodeKey) -> Option<&Vec<Value>> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    /// Key of an existing node given as a raw value.
    fn resolve(&self, value: &Value) -> Result<NodeKey, StoreError> {
        let key = NodeKey::from_value(value).ok_or_else(|| {
            StoreError::MalformedStatement(format!("{value:?} is not a node key"))
        })?;
        if !self.contains(&key) {
            return Err(StoreError::MissingNode {
                table: self.def.name.clone(),
                key: key.to_string(),
            });
        }
        Ok(key)
    }

    fn load(&mut self, frame: &RecordFrame) -> Result<usize, StoreError> {
        let table = &self.def.name;
        let positions = column_positions(table, &self.def.columns, &frame.columns)?;
        if !frame.column_names().any(|c| c == self.def.primary_key) {
            return Err(StoreError::MalformedStatement(format!(
                "load into {table} does not provide primary key {}",
                self.def.primary_key
            )));
        }
        let key_position = self.key_position();
        let mut staged = Vec::with_capacity(frame.len());
        let mut new_keys = HashSet::new();
        for row in &frame.rows {
            let full = widen_row(table, &self.def.columns, &positions, row)?;
            let key = NodeKey::from_value(&full[key_position]).ok_or_else(|| {
                StoreError::MalformedStatement(format!("{table} row without primary key"))
            })?;
            if self.index.contains_key(&key) || !new_keys.insert(key.clone()) {
                return Err(StoreError::DuplicatePrimaryKey {
                    table: table.clone(),
                    key: key.to_string(),
                });
            }
            staged.push((key, full));
        }
        let loaded = staged.len();
        for (key, row) in staged {
            self.index.insert(key, self.rows.len());
            self.rows.push(row);
        }
        Ok(loaded)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(super) struct StoredEdge {
    pub(super) from: NodeKey,
    pub(super) to: NodeKey,
    pub(super) properties: Vec<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(super) struct RelTable {
    pub(super) def: RelTableDef,
    pub(super) edges: Vec<StoredEdge>,
}

/// Whole content of one store: the catalog and the data of every table.
#[derive(Serialize, Deserialize, Debug, Default)]
pub(super) struct GraphSnapshot {
    pub(super) node_tables: BTreeMap<String, NodeTable>,
    pub(super) rel_tables: BTreeMap<String, RelTable>,
}

/// Position of every frame column in the table columns, checking names and types.
fn column_positions(
    table: &str,
    table_columns: &[ColumnDef],
    frame_columns: &[ColumnDef],
) -> Result<Vec<usize>, StoreError> {
    let mut seen = HashSet::new();
    frame_columns
        .iter()
        .map(|column| {
            if !seen.insert(column.name.as_str()) {
                return Err(StoreError::MalformedStatement(format!(
                    "column {} given twice for {table}",
                    column.name
                )));
            }
            let position = table_columns
                .iter()
                .position(|c| c.name == column.name)
                .ok_or_else(|| StoreError::UnknownColumn {
                    table: table.to_string(),
                    column: column.name.clone(),
                })?;
            let expected = table_columns[position].column_type;
            if expected != column.column_type {
                return Err(StoreError::TypeMismatch {
                    table: table.to_string(),
                    column: column.name.clone(),
                    expected,
                    found: column.column_type.to_string(),
                });
            }
            Ok(position)
        })
        .collect()
}

fn widen_row(
    table: &str,
    table_columns: &[ColumnDef],
    positions: &[usize],
    row: &[Value],
) -> Result<Vec<Value>, StoreError> {
    if row.len() != positions.len() {
        return Err(StoreError::MalformedStatement(format!(
            "{table} row has {} values for {} columns",
            row.len(),
            positions.len()
        )));
    }
    let mut full = vec![Value::Null; table_columns.len()];
    for (value, &position) in row.iter().zip(positions) {
        let column = &table_columns[position];
        if !value.fits(column.column_type) {
            return Err(StoreError::TypeMismatch {
                table: table.to_string(),
                column: column.name.clone(),
                expected: column.column_type,
                found: format!("{value:?}"),
            });
        }
        full[position] = value.clone();
    }
    Ok(full)
}

fn check_identifiers<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), StoreError> {
    let mut seen = HashSet::new();
    for name in names {
        if !is_valid_identifier(name) {
            return Err(StoreError::MalformedStatement(format!(
                "`{name}` is not a valid identifier"
            )));
        }
        if !seen.insert(name) {
            return Err(StoreError::MalformedStatement(format!(
                "`{name}` is defined twice"
            )));
        }
    }
    Ok(())
}

impl GraphSnapshot {
    pub(super) fn apply(&mut self, statement: &Statement) -> Result<StatementSummary, StoreError> {
        let rows_affected = match statement {
            Statement::CreateNodeTable(def) => self.create_node_table(def)?,
            Statement::CreateRelTable(def) => self.create_rel_table(def)?,
            Statement::LoadNodes { table, frame } => self
                .node_tables
                .get_mut(table)
                .ok_or_else(|| StoreError::UnknownTable(table.clone()))?
                .load(frame)?,
            Statement::CopyRel { table, frame } => self.copy_rel(table, frame)?,
            Statement::MatchCreate(batch) => self.match_create(batch)?,
        };
        Ok(StatementSummary { rows_affected })
    }

    fn table_exists(&self, name: &str) -> bool {
        self.node_tables.contains_key(name) || self.rel_tables.contains_key(name)
    }

    fn create_node_table(&mut self, def: &NodeTableDef) -> Result<usize, StoreError> {
        check_identifiers([def.name.as_str()])?;
        check_identifiers(def.columns.iter().map(|c| c.name.as_str()))?;
        if self.table_exists(&def.name) {
            return Err(StoreError::TableExists(def.name.clone()));
        }
        match def.primary_key_type() {
            Some(ColumnType::Int32) | Some(ColumnType::String) => {}
            Some(other) => {
                return Err(StoreError::MalformedStatement(format!(
                    "primary key {}.{} cannot be of type {other}",
                    def.name, def.primary_key
                )))
            }
            None => {
                return Err(StoreError::UnknownColumn {
                    table: def.name.clone(),
                    column: def.primary_key.clone(),
                })
            }
        }
        self.node_tables
            .insert(def.name.clone(), NodeTable::new(def.clone()));
        Ok(0)
    }

    fn create_rel_table(&mut self, def: &RelTableDef) -> Result<usize, StoreError> {
        check_identifiers([def.name.as_str()])?;
        check_identifiers(def.columns.iter().map(|c| c.name.as_str()))?;
        if self.table_exists(&def.name) {
            return Err(StoreError::TableExists(def.name.clone()));
        }
        for endpoint in [&def.from, &def.to] {
            if !self.node_tables.contains_key(endpoint) {
                return Err(StoreError::UnknownTable(endpoint.clone()));
            }
        }
        self.rel_tables.insert(
            def.name.clone(),
            RelTable {
                def: def.clone(),
                edges: Vec::new(),
            },
        );
        Ok(0)
    }

    fn endpoint_table(&self, name: &str) -> Result<&NodeTable, StoreError> {
        self.node_tables
            .get(name)
            .ok_or_else(|| StoreError::UnknownTable(name.to_string()))
    }

    fn copy_rel(&mut self, table: &str, frame: &RecordFrame) -> Result<usize, StoreError> {
        let rel = self
            .rel_tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        if frame.columns.len() < 2 {
            return Err(StoreError::MalformedStatement(format!(
                "copy into {table} needs source and target columns"
            )));
        }
        let from = self.endpoint_table(&rel.def.from)?;
        let to = self.endpoint_table(&rel.def.to)?;
        let positions = column_positions(table, &rel.def.columns, &frame.columns[2..])?;

        let mut staged = Vec::with_capacity(frame.len());
        for row in &frame.rows {
            if row.len() < 2 {
                return Err(StoreError::MalformedStatement(format!(
                    "{table} row without endpoints"
                )));
            }
            let source = from.resolve(&row[0])?;
            let target = to.resolve(&row[1])?;
            let properties = widen_row(table, &rel.def.columns, &positions, &row[2..])?;
            staged.push(StoredEdge {
                from: source,
                to: target,
                properties,
            });
        }

        let copied = staged.len();
        if let Some(rel) = self.rel_tables.get_mut(table) {
            rel.edges.extend(staged);
        }
        Ok(copied)
    }

    fn match_create(&mut self, batch: &MatchCreate) -> Result<usize, StoreError> {
        for binding in &batch.bindings {
            let node_table = self.endpoint_table(&binding.table)?;
            if node_table.def.primary_key != binding.key_column {
                return Err(StoreError::MalformedStatement(format!(
                    "{}.{} is not the primary key",
                    binding.table, binding.key_column
                )));
            }
            if !node_table.contains(&binding.key) {
                return Err(StoreError::MissingNode {
                    table: binding.table.clone(),
                    key: binding.key.to_string(),
                });
            }
        }

        let mut staged = Vec::with_capacity(batch.edges.len());
        for edge in &batch.edges {
            let rel = self
                .rel_tables
                .get(&edge.rel_table)
                .ok_or_else(|| StoreError::UnknownTable(edge.rel_table.clone()))?;
            let binding = |i: usize| {
                batch.bindings.get(i).ok_or_else(|| {
                    StoreError::MalformedStatement(format!("unbound node variable n_{i}"))
                })
            };
            let source = binding(edge.source)?;
            let target = binding(edge.target)?;
            if source.table != rel.def.from || target.table != rel.def.to {
                return Err(StoreError::MalformedStatement(format!(
                    "{} connects {} to {}, not {} to {}",
                    rel.def.name, rel.def.from, rel.def.to, source.table, target.table
                )));
            }
            staged.push((
                edge.rel_table.as_str(),
                StoredEdge {
                    from: source.key.clone(),
                    to: target.key.clone(),
                    properties: vec![Value::Null; rel.def.columns.len()],
                },
            ));
        }

        let created = staged.len();
        for (rel_table, edge) in staged {
            if let Some(rel) = self.rel_tables.get_mut(rel_table) {
                rel.edges.push(edge);
            }
        }
        Ok(created)
    }
}
