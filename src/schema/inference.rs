use log::{debug, info};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{
    ColumnDef, NodeTableDef, PropertyDeclaration, RelTableDef, RelationDeclaration,
    TypeDeclaration,
};
use crate::{
    normalize::{normalize, normalize_relation_label, RelationNameCache},
    IngestError, IngestResult,
};

/// Every node table is keyed by this column.
pub const PRIMARY_KEY: &str = "id";

/// Node tables keyed by the record type tag they hold.
pub type NodeSchema = BTreeMap<String, NodeTableDef>;

/// How relation table names are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationNaming {
    /// the normalized relation label alone, for graphs with a single node table
    Label,
    /// `{FromTable}_{relation_label}_{ToTable}`
    EndpointQualified,
}

fn collision(name: &str, first: &str, second: &str) -> IngestError {
    IngestError::SchemaDefinitionFailure {
        target: name.to_string(),
        super_error: format!("`{first}` and `{second}` both normalize to table name `{name}`")
            .into(),
    }
}

fn supported_columns(properties: &[PropertyDeclaration], owner: &str) -> Vec<ColumnDef> {
    let mut columns: Vec<ColumnDef> = Vec::new();
    let mut dropped = Vec::new();
    for property in properties {
        match property.kind.column_type() {
            Some(column_type) => {
                if !columns.iter().any(|c| c.name == property.name) {
                    columns.push(ColumnDef::new(&property.name, column_type));
                }
            }
            None => dropped.push(property.name.as_str()),
        }
    }
    if !dropped.is_empty() {
        info!("{owner}: properties of unsupported kinds are not materialized: {dropped:?}");
    }
    columns
}

/// Derives one node table per declared type.
///
/// Columns come from the declared properties of supported kinds, in declaration order, so a
/// table accepts any instance of its type and not only the instances seen so far.
pub fn infer_node_schema(catalog: &[TypeDeclaration]) -> IngestResult<NodeSchema> {
    let mut tables = NodeSchema::new();
    let mut owners: HashMap<String, &str> = HashMap::new();
    for declaration in catalog {
        if tables.contains_key(&declaration.type_tag) {
            continue;
        }
        let name = normalize(&declaration.type_tag);
        if let Some(owner) = owners.get(&name) {
            return Err(collision(&name, owner, &declaration.type_tag));
        }
        let columns = supported_columns(&declaration.properties, &declaration.type_tag);
        if !columns.iter().any(|c| c.name == PRIMARY_KEY) {
            return Err(IngestError::SchemaDefinitionFailure {
                target: name,
                super_error: format!(
                    "type `{}` declares no supported `{PRIMARY_KEY}` property",
                    declaration.type_tag
                )
                .into(),
            });
        }
        debug!("Node table {} with {} columns", name, columns.len());
        owners.insert(name.clone(), &declaration.type_tag);
        tables.insert(
            declaration.type_tag.clone(),
            NodeTableDef {
                name,
                columns,
                primary_key: PRIMARY_KEY.to_string(),
            },
        );
    }
    Ok(tables)
}

/// Derives one relation table per distinct (label, source type, target type) declaration.
///
/// Only the combinations present in `catalog` are created, never the cross product of all
/// node types and labels.
pub fn infer_relation_schema(
    catalog: &[RelationDeclaration],
    nodes: &NodeSchema,
    naming: RelationNaming,
) -> IngestResult<Vec<RelTableDef>> {
    let node_table_names: HashSet<&str> = nodes.values().map(|t| t.name.as_str()).collect();
    let mut cache = RelationNameCache::new();
    let mut seen = HashSet::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut tables = Vec::new();

    for declaration in catalog {
        let key = (
            declaration.label.as_str(),
            declaration.source_tag.as_str(),
            declaration.target_tag.as_str(),
        );
        if !seen.insert(key) {
            continue;
        }
        let endpoint = |tag: &str| {
            nodes
                .get(tag)
                .ok_or_else(|| IngestError::SchemaDefinitionFailure {
                    target: declaration.label.clone(),
                    super_error: format!("endpoint type `{tag}` has no node table").into(),
                })
        };
        let from = endpoint(&declaration.source_tag)?;
        let to = endpoint(&declaration.target_tag)?;

        let name = match naming {
            RelationNaming::Label => cache.class_name(&declaration.label).to_string(),
            RelationNaming::EndpointQualified => format!(
                "{}_{}_{}",
                from.name,
                normalize_relation_label(&declaration.label),
                to.name
            ),
        };
        let description = format!(
            "{} ({} -> {})",
            declaration.label, declaration.source_tag, declaration.target_tag
        );
        if node_table_names.contains(name.as_str()) {
            return Err(collision(&name, &format!("node type {name}"), &description));
        }
        if let Some(owner) = owners.get(&name) {
            return Err(collision(&name, owner, &description));
        }
        owners.insert(name.clone(), description.clone());

        tables.push(RelTableDef {
            name,
            label: declaration.label.clone(),
            from: from.name.clone(),
            to: to.name.clone(),
            columns: supported_columns(&declaration.properties, &description),
        });
    }
    Ok(tables)
}
