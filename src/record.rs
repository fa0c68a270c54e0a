//! Normalized records produced by the dataset adapters and tabular frames handed to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::{ColumnDef, ColumnType};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Float(f32),
    Int32(i32),
    String(String),
    Timestamp(DateTime<Utc>),
    Null,
}

static NULL: Value = Value::Null;

impl Value {
    /// `None` for [Value::Null], which fits any column.
    pub fn column_type(&self) -> Option<ColumnType> {
        let column_type = match self {
            Value::Boolean(_) => ColumnType::Boolean,
            Value::Float(_) => ColumnType::Float,
            Value::Int32(_) => ColumnType::Int32,
            Value::String(_) => ColumnType::String,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Null => return None,
        };
        Some(column_type)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn fits(&self, column_type: ColumnType) -> bool {
        self.column_type().map_or(true, |t| t == column_type)
    }

    /// Renders the value as a Cypher literal.
    pub fn to_literal(&self) -> String {
        match self {
            Value::String(val) => format!("'{}'", val.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Timestamp(val) => format!("timestamp('{}')", val.to_rfc3339()),
            Value::Null => "NULL".to_string(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(val) => f.write_fmt(format_args!("{val}")),
            Value::Float(val) => f.write_fmt(format_args!("{val}")),
            Value::Int32(val) => f.write_fmt(format_args!("{val}")),
            Value::String(val) => f.write_fmt(format_args!("{val}")),
            Value::Timestamp(val) => f.write_fmt(format_args!("{}", val.to_rfc3339())),
            Value::Null => f.write_str(""),
        }
    }
}

/// Primary key value of a node.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Int(i32),
    Str(String),
}

impl NodeKey {
    pub fn to_value(&self) -> Value {
        match self {
            NodeKey::Int(id) => Value::Int32(*id),
            NodeKey::Str(id) => Value::String(id.clone()),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32(id) => Some(NodeKey::Int(*id)),
            Value::String(id) => Some(NodeKey::Str(id.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKey::Int(id) => write!(f, "{id}"),
            NodeKey::Str(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub key: NodeKey,
    /// the source type this record belongs to, e.g. `threat-actor`
    pub type_tag: String,
    /// property values, including the key under the `id` column
    pub properties: BTreeMap<String, Value>,
}

impl NodeRecord {
    pub fn new(type_tag: impl Into<String>, key: NodeKey) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(crate::schema::PRIMARY_KEY.to_string(), key.to_value());
        Self {
            key,
            type_tag: type_tag.into(),
            properties,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> &Value {
        self.properties.get(name).unwrap_or(&NULL)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub source: NodeKey,
    pub target: NodeKey,
    /// relation label as found in the source data
    pub label: String,
    pub properties: BTreeMap<String, Value>,
    pub source_type: String,
    pub target_type: String,
}

impl EdgeRecord {
    pub fn get(&self, name: &str) -> &Value {
        self.properties.get(name).unwrap_or(&NULL)
    }
}

/// Column-major description with row-major values: the tabular record set of a bulk load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RecordFrame {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordFrame {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
