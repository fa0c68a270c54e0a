use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::ColumnType;

/// Property kinds declared by a source format's type system.
///
/// The set is closed: every kind either maps to one [ColumnType] or is unsupported, in which
/// case properties of that kind are left out of both schema and data.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum PropertyKind {
    Boolean,
    Float,
    Id,
    Integer,
    String,
    Timestamp,
    // not materialized
    Type,
    Reference,
    List,
    OpenVocab,
    Enum,
    Pattern,
    Hashes,
    Dictionary,
    Extensions,
    Binary,
    Hex,
}

impl PropertyKind {
    pub fn column_type(&self) -> Option<ColumnType> {
        let column_type = match self {
            PropertyKind::Boolean => ColumnType::Boolean,
            PropertyKind::Float => ColumnType::Float,
            PropertyKind::Id | PropertyKind::String => ColumnType::String,
            PropertyKind::Integer => ColumnType::Int32,
            PropertyKind::Timestamp => ColumnType::Timestamp,
            _ => return None,
        };
        Some(column_type)
    }

    pub fn is_supported(&self) -> bool {
        self.column_type().is_some()
    }
}

/// A property as declared by the source type system, regardless of whether it is supported.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    pub name: String,
    pub kind: PropertyKind,
}

impl PropertyDeclaration {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
