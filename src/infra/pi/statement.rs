use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    record::{NodeKey, RecordFrame},
    schema::{ColumnDef, NodeTableDef, RelTableDef},
};

/// A node matched by primary key in a [MatchCreate] statement.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeBinding {
    pub table: String,
    pub key_column: String,
    pub key: NodeKey,
}

/// One edge to create between two bindings of a [MatchCreate] statement, by binding index.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCreation {
    pub source: usize,
    pub rel_table: String,
    pub target: usize,
}

/// Resolves every binding once with a single multi-pattern `MATCH`, then creates all edges.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchCreate {
    pub bindings: Vec<NodeBinding>,
    pub edges: Vec<EdgeCreation>,
}

/// Statements understood by a graph store connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateNodeTable(NodeTableDef),
    CreateRelTable(RelTableDef),
    /// bulk-load rows into a node table, mapping frame columns to table columns by name
    LoadNodes { table: String, frame: RecordFrame },
    /// bulk-copy rows into a relation table; the first two frame columns are the endpoints
    CopyRel { table: String, frame: RecordFrame },
    MatchCreate(MatchCreate),
}

impl Statement {
    /// Short description used in error reports.
    pub fn target(&self) -> String {
        match self {
            Statement::CreateNodeTable(table) => format!("node table {}", table.name),
            Statement::CreateRelTable(table) => format!("relation table {}", table.name),
            Statement::LoadNodes { table, frame } => {
                format!("load of {} rows into {table}", frame.len())
            }
            Statement::CopyRel { table, frame } => {
                format!("copy of {} rows into {table}", frame.len())
            }
            Statement::MatchCreate(batch) => format!("batch of {} edges", batch.edges.len()),
        }
    }

    pub fn is_schema_definition(&self) -> bool {
        matches!(
            self,
            Statement::CreateNodeTable(_) | Statement::CreateRelTable(_)
        )
    }
}

fn column_list(columns: &[ColumnDef]) -> String {
    columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.column_type))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Statement::CreateNodeTable(table) => write!(
                f,
                "CREATE NODE TABLE {}({}, PRIMARY KEY ({}));",
                table.name,
                column_list(&table.columns),
                table.primary_key
            ),
            Statement::CreateRelTable(table) if table.columns.is_empty() => write!(
                f,
                "CREATE REL TABLE {}(FROM {} TO {});",
                table.name, table.from, table.to
            ),
            Statement::CreateRelTable(table) => write!(
                f,
                "CREATE REL TABLE {}(FROM {} TO {}, {});",
                table.name,
                table.from,
                table.to,
                column_list(&table.columns)
            ),
            Statement::LoadNodes { table, frame } => write!(
                f,
                "LOAD FROM $rows CREATE (n:{} {{{}}}); // {} rows",
                table,
                frame
                    .column_names()
                    .map(|c| format!("{c}: {c}"))
                    .collect::<Vec<_>>()
                    .join(", "),
                frame.len()
            ),
            Statement::CopyRel { table, frame } => {
                write!(f, "COPY {} FROM $rows; // {} rows", table, frame.len())
            }
            Statement::MatchCreate(batch) => {
                let matches = batch
                    .bindings
                    .iter()
                    .enumerate()
                    .map(|(i, b)| {
                        format!(
                            "(n_{i}:{} {{{}: {}}})",
                            b.table,
                            b.key_column,
                            b.key.to_value().to_literal()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let creates = batch
                    .edges
                    .iter()
                    .map(|e| format!("(n_{})-[:{}]->(n_{})", e.source, e.rel_table, e.target))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "MATCH {matches}\nCREATE {creates};")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_render_schema_statements() {
        let node = Statement::CreateNodeTable(NodeTableDef {
            name: "Node".to_string(),
            columns: vec![
                ColumnDef::new("id", ColumnType::Int32),
                ColumnDef::new("label", ColumnType::String),
            ],
            primary_key: "id".to_string(),
        });
        assert_eq!(
            node.to_string(),
            "CREATE NODE TABLE Node(id INT32, label STRING, PRIMARY KEY (id));"
        );
        assert!(node.is_schema_definition());

        let rel = Statement::CreateRelTable(RelTableDef {
            name: "FilmFilmGenre".to_string(),
            label: "/film/film/genre".to_string(),
            from: "Node".to_string(),
            to: "Node".to_string(),
            columns: vec![],
        });
        assert_eq!(
            rel.to_string(),
            "CREATE REL TABLE FilmFilmGenre(FROM Node TO Node);"
        );
    }

    #[test]
    fn test_render_match_create() {
        let binding = |id| NodeBinding {
            table: "Node".to_string(),
            key_column: "id".to_string(),
            key: NodeKey::Int(id),
        };
        let batch = Statement::MatchCreate(MatchCreate {
            bindings: vec![binding(1), binding(2)],
            edges: vec![
                EdgeCreation {
                    source: 0,
                    rel_table: "Likes".to_string(),
                    target: 1,
                },
                EdgeCreation {
                    source: 1,
                    rel_table: "Likes".to_string(),
                    target: 0,
                },
            ],
        });
        assert_eq!(
            batch.to_string(),
            "MATCH (n_0:Node {id: 1}), (n_1:Node {id: 2})\nCREATE (n_0)-[:Likes]->(n_1), (n_1)-[:Likes]->(n_0);"
        );
        assert_eq!(batch.target(), "batch of 2 edges");
    }
}
