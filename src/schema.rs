//! Property-graph schema: column types, the source property kinds that map onto them, table
//! definitions, and the inference of node and relation tables from declared type catalogs.

mod column_type;
mod inference;
mod property_kind;
mod table;

pub use column_type::ColumnType;
pub use inference::{
    infer_node_schema, infer_relation_schema, NodeSchema, RelationNaming, PRIMARY_KEY,
};
pub use property_kind::{PropertyDeclaration, PropertyKind};
pub use table::{ColumnDef, NodeTableDef, RelTableDef, RelationDeclaration, TypeDeclaration};
