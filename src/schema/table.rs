use serde::{Deserialize, Serialize};

use super::{ColumnType, PropertyDeclaration};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// A node table: normalized name, ordered typed columns and the primary key column.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeTableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: String,
}

impl NodeTableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_type(&self) -> Option<ColumnType> {
        self.column(&self.primary_key).map(|c| c.column_type)
    }
}

/// A relation table between exactly one source and one target node table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RelTableDef {
    pub name: String,
    /// the relation label as found in the source data
    pub label: String,
    pub from: String,
    pub to: String,
    pub columns: Vec<ColumnDef>,
}

impl RelTableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Declared property schema of one node type, keyed by the record type tag.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub type_tag: String,
    pub properties: Vec<PropertyDeclaration>,
}

/// One relation table to derive: a relation label between two node type tags.
#[derive(Debug, Clone)]
pub struct RelationDeclaration {
    pub label: String,
    pub source_tag: String,
    pub target_tag: String,
    pub properties: Vec<PropertyDeclaration>,
}
