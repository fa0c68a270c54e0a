use std::collections::HashMap;

use crate::{
    infra::pi::{EdgeCreation, MatchCreate, NodeBinding},
    record::{EdgeRecord, NodeKey, NodeRecord, RecordFrame},
    schema::{ColumnDef, NodeTableDef, RelTableDef},
};

/// Load frame of one node table. Columns without any value among `nodes` are left out.
pub(super) fn node_frame(table: &NodeTableDef, nodes: &[&NodeRecord]) -> RecordFrame {
    let columns: Vec<ColumnDef> = table
        .columns
        .iter()
        .filter(|c| c.name == table.primary_key || nodes.iter().any(|n| !n.get(&c.name).is_null()))
        .cloned()
        .collect();
    let mut frame = RecordFrame::new(columns);
    for node in nodes {
        let row = frame
            .columns
            .iter()
            .map(|c| node.get(&c.name).clone())
            .collect();
        frame.push(row);
    }
    frame
}

/// Copy frame of one relation table: `from`, `to`, then the declared relation columns.
pub(super) fn rel_frame(
    table: &RelTableDef,
    from: &NodeTableDef,
    to: &NodeTableDef,
    edges: &[&EdgeRecord],
) -> RecordFrame {
    let mut columns = Vec::with_capacity(table.columns.len() + 2);
    if let Some(key_type) = from.primary_key_type() {
        columns.push(ColumnDef::new("from", key_type));
    }
    if let Some(key_type) = to.primary_key_type() {
        columns.push(ColumnDef::new("to", key_type));
    }
    columns.extend(table.columns.iter().cloned());
    let mut frame = RecordFrame::new(columns);
    for edge in edges {
        let mut row = vec![edge.source.to_value(), edge.target.to_value()];
        row.extend(table.columns.iter().map(|c| edge.get(&c.name).clone()));
        frame.push(row);
    }
    frame
}

/// Builds one `MATCH ... CREATE` batch, binding every distinct endpoint once.
#[derive(Debug, Default)]
pub(super) struct MatchCreateBuilder {
    batch: MatchCreate,
    bound: HashMap<(String, NodeKey), usize>,
}

impl MatchCreateBuilder {
    fn bind(&mut self, table: &NodeTableDef, key: &NodeKey) -> usize {
        let next = self.batch.bindings.len();
        let index = *self
            .bound
            .entry((table.name.clone(), key.clone()))
            .or_insert(next);
        if index == next {
            self.batch.bindings.push(NodeBinding {
                table: table.name.clone(),
                key_column: table.primary_key.clone(),
                key: key.clone(),
            });
        }
        index
    }

    pub(super) fn push(
        &mut self,
        rel_table: &RelTableDef,
        from: &NodeTableDef,
        to: &NodeTableDef,
        edge: &EdgeRecord,
    ) {
        let source = self.bind(from, &edge.source);
        let target = self.bind(to, &edge.target);
        self.batch.edges.push(EdgeCreation {
            source,
            rel_table: rel_table.name.clone(),
            target,
        });
    }

    pub(super) fn finish(self) -> MatchCreate {
        self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        record::Value,
        schema::{ColumnType, PRIMARY_KEY},
    };
    use std::collections::BTreeMap;

    fn identity_table() -> NodeTableDef {
        NodeTableDef {
            name: "Identity".to_string(),
            columns: vec![
                ColumnDef::new(PRIMARY_KEY, ColumnType::String),
                ColumnDef::new("name", ColumnType::String),
                ColumnDef::new("confidence", ColumnType::Int32),
            ],
            primary_key: PRIMARY_KEY.to_string(),
        }
    }

    #[test]
    fn test_node_frame_omits_empty_columns() {
        let a = NodeRecord::new("identity", NodeKey::Str("identity--a".into()))
            .with_property("name", Value::String("ACME".into()));
        let b = NodeRecord::new("identity", NodeKey::Str("identity--b".into()));
        let frame = node_frame(&identity_table(), &[&a, &b]);
        assert_eq!(frame.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(frame.rows[1], vec![Value::String("identity--b".into()), Value::Null]);
    }

    #[test]
    fn test_match_create_binds_endpoints_once() {
        let table = NodeTableDef {
            name: "Node".to_string(),
            columns: vec![ColumnDef::new(PRIMARY_KEY, ColumnType::Int32)],
            primary_key: PRIMARY_KEY.to_string(),
        };
        let rel = RelTableDef {
            name: "R".to_string(),
            label: "r".to_string(),
            from: "Node".to_string(),
            to: "Node".to_string(),
            columns: vec![],
        };
        let edge = |s, t| EdgeRecord {
            source: NodeKey::Int(s),
            target: NodeKey::Int(t),
            label: "r".to_string(),
            properties: BTreeMap::new(),
            source_type: "Node".to_string(),
            target_type: "Node".to_string(),
        };
        let mut builder = MatchCreateBuilder::default();
        builder.push(&rel, &table, &table, &edge(1, 2));
        builder.push(&rel, &table, &table, &edge(2, 1));
        builder.push(&rel, &table, &table, &edge(2, 3));
        let batch = builder.finish();
        assert_eq!(batch.bindings.len(), 3);
        assert_eq!(batch.edges.len(), 3);
        assert_eq!((batch.edges[1].source, batch.edges[1].target), (1, 0));
    }
}
