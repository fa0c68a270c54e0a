mod type_registry;

pub use type_registry::{declared_properties, is_registered, RELATIONSHIP_TYPE};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde_json::{Map, Value as JsonValue};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap, HashSet},
};

use super::{DatasetAdapter, LoadedRecords};
use crate::{
    config::DanglingReferencePolicy,
    dataset::{AdapterKind, StixSpecification},
    loader::EdgeLoadMode,
    record::{EdgeRecord, NodeKey, NodeRecord, Value},
    sampler::EndpointRule,
    schema::{
        ColumnType, PropertyDeclaration, RelationDeclaration, RelationNaming, TypeDeclaration,
    },
    IngestError, IngestResult,
};

/// Reads a STIX 2.x bundle: every object but relationships becomes a node, every
/// relationship between two known objects becomes an edge.
#[derive(Debug, Clone)]
pub struct StixAdapter {
    file_content: String,
    dangling_references: DanglingReferencePolicy,
}

#[derive(Debug)]
struct StixObject {
    type_tag: String,
    id: String,
    modified: Option<DateTime<Utc>>,
    fields: Map<String, JsonValue>,
}

impl StixObject {
    fn from_fields(position: usize, fields: Map<String, JsonValue>) -> IngestResult<Self> {
        let text = |name: &str| {
            fields
                .get(name)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    IngestError::InvalidSource(format!(
                        "STIX object #{position} has no string `{name}`"
                    ))
                })
        };
        let type_tag = text("type")?;
        let id = text("id")?;
        let modified = fields
            .get("modified")
            .and_then(JsonValue::as_str)
            .and_then(parse_timestamp);
        Ok(Self {
            type_tag,
            id,
            modified,
            fields,
        })
    }

    fn text(&self, name: &str) -> IngestResult<&str> {
        self.fields
            .get(name)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                IngestError::InvalidSource(format!("{} has no string `{name}`", self.id))
            })
    }

    /// Values of the declared properties of supported kinds present on the object.
    fn properties(&self, declared: &[PropertyDeclaration]) -> BTreeMap<String, Value> {
        let mut properties = BTreeMap::new();
        for declaration in declared {
            let (Some(column_type), Some(raw)) =
                (declaration.kind.column_type(), self.fields.get(&declaration.name))
            else {
                continue;
            };
            if raw.is_null() {
                continue;
            }
            match convert(raw, column_type) {
                Some(value) => {
                    properties.insert(declaration.name.clone(), value);
                }
                None => warn!(
                    "{}: `{}` is not a valid {column_type}, ignored",
                    self.id, declaration.name
                ),
            }
        }
        properties
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn convert(raw: &JsonValue, column_type: ColumnType) -> Option<Value> {
    match column_type {
        ColumnType::Boolean => raw.as_bool().map(Value::Boolean),
        ColumnType::Float => raw.as_f64().map(|v| Value::Float(v as f32)),
        ColumnType::Int32 => raw
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int32),
        ColumnType::String => raw.as_str().map(|v| Value::String(v.to_string())),
        ColumnType::Timestamp => raw.as_str().and_then(parse_timestamp).map(Value::Timestamp),
    }
}

/// Unwraps a `data:` URL, as uploaded by web clients. Anything else is returned as is.
fn decode_content(content: &str) -> IngestResult<Cow<'_, str>> {
    let Some(rest) = content.trim_start().strip_prefix("data:") else {
        return Ok(Cow::Borrowed(content));
    };
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| IngestError::InvalidSource("data URL without payload".to_string()))?;
    if !header.split(';').any(|part| part == "base64") {
        return Ok(Cow::Owned(payload.to_string()));
    }
    let bytes = STANDARD.decode(payload.trim()).map_err(|e| {
        IngestError::InvalidSource(format!("data URL payload is not valid base64: {e}"))
    })?;
    String::from_utf8(bytes)
        .map(Cow::Owned)
        .map_err(|e| IngestError::InvalidSource(format!("data URL payload is not UTF-8: {e}")))
}

/// Accepts a bundle, a bare list of objects or a single object.
fn parse_objects(content: &str) -> IngestResult<Vec<StixObject>> {
    let document: JsonValue = serde_json::from_str(content)
        .map_err(|e| IngestError::InvalidSource(format!("not a STIX document: {e}")))?;
    let entries = match document {
        JsonValue::Array(entries) => entries,
        JsonValue::Object(mut bundle)
            if bundle.get("type").and_then(JsonValue::as_str) == Some("bundle") =>
        {
            match bundle.remove("objects") {
                Some(JsonValue::Array(entries)) => entries,
                None => Vec::new(),
                Some(_) => {
                    return Err(IngestError::InvalidSource(
                        "bundle `objects` must be a list".to_string(),
                    ))
                }
            }
        }
        object @ JsonValue::Object(_) => vec![object],
        _ => {
            return Err(IngestError::InvalidSource(
                "a STIX document is a bundle, an object or a list of objects".to_string(),
            ))
        }
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(position, entry)| match entry {
            JsonValue::Object(fields) => StixObject::from_fields(position, fields),
            _ => Err(IngestError::InvalidSource(format!(
                "STIX object #{position} is not a JSON object"
            ))),
        })
        .collect()
}

/// Keeps one version per id: the most recently modified, the later one on ties.
fn deduplicate(objects: Vec<StixObject>) -> Vec<StixObject> {
    let total = objects.len();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<StixObject> = Vec::with_capacity(total);
    for object in objects {
        match positions.get(&object.id) {
            Some(&i) => {
                if object.modified >= kept[i].modified {
                    kept[i] = object;
                }
            }
            None => {
                positions.insert(object.id.clone(), kept.len());
                kept.push(object);
            }
        }
    }
    if kept.len() < total {
        info!("{} STIX objects superseded by another version", total - kept.len());
    }
    kept
}

impl StixAdapter {
    pub fn new(spec: &StixSpecification, dangling_references: DanglingReferencePolicy) -> Self {
        Self {
            file_content: spec.file_content.clone(),
            dangling_references,
        }
    }

    fn dangling(&self, relationship: &StixObject, reference: &str) -> IngestResult<()> {
        match self.dangling_references {
            DanglingReferencePolicy::Skip => {
                warn!(
                    "{} references {reference}, absent from the bundle; skipped",
                    relationship.id
                );
                Ok(())
            }
            DanglingReferencePolicy::Fail => Err(IngestError::DataLoadFailure {
                target: relationship.id.clone(),
                super_error: format!("reference to {reference}, absent from the bundle").into(),
            }),
        }
    }
}

impl DatasetAdapter for StixAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Stix
    }

    fn load(&self) -> IngestResult<LoadedRecords> {
        let content = decode_content(&self.file_content)?;
        let objects = deduplicate(parse_objects(&content)?);
        let (relationships, others): (Vec<&StixObject>, Vec<&StixObject>) = objects
            .iter()
            .partition(|o| o.type_tag == RELATIONSHIP_TYPE);

        let mut declared: HashMap<&str, Vec<PropertyDeclaration>> = HashMap::new();
        let mut nodes = Vec::with_capacity(others.len());
        for object in &others {
            let declaration = declared
                .entry(object.type_tag.as_str())
                .or_insert_with(|| {
                    if !is_registered(&object.type_tag) {
                        info!(
                            "STIX type `{}` is not registered, only common properties are kept",
                            object.type_tag
                        );
                    }
                    declared_properties(&object.type_tag)
                });
            let mut node = NodeRecord::new(&object.type_tag, NodeKey::Str(object.id.clone()));
            node.properties.extend(object.properties(declaration));
            nodes.push(node);
        }

        let types: HashMap<&str, &str> = others
            .iter()
            .map(|o| (o.id.as_str(), o.type_tag.as_str()))
            .collect();
        let relationship_properties = declared_properties(RELATIONSHIP_TYPE);
        let mut edges = Vec::with_capacity(relationships.len());
        let mut relation_labels: Vec<String> = Vec::new();
        for relationship in relationships {
            let label = relationship.text("relationship_type")?;
            let source = relationship.text("source_ref")?;
            let target = relationship.text("target_ref")?;
            if !relation_labels.iter().any(|l| l == label) {
                relation_labels.push(label.to_string());
            }
            let (source_type, target_type) = match (types.get(source), types.get(target)) {
                (Some(s), Some(t)) => (*s, *t),
                (None, _) => {
                    self.dangling(relationship, source)?;
                    continue;
                }
                (_, None) => {
                    self.dangling(relationship, target)?;
                    continue;
                }
            };
            edges.push(EdgeRecord {
                source: NodeKey::Str(source.to_string()),
                target: NodeKey::Str(target.to_string()),
                label: label.to_string(),
                properties: relationship.properties(&relationship_properties),
                source_type: source_type.to_string(),
                target_type: target_type.to_string(),
            });
        }
        info!(
            "STIX bundle holds {} nodes and {} resolvable relationships",
            nodes.len(),
            edges.len()
        );
        Ok(LoadedRecords {
            nodes,
            edges,
            relation_labels,
        })
    }

    /// One declaration per type among `records`, not per registered type.
    fn type_catalog(&self, records: &LoadedRecords) -> Vec<TypeDeclaration> {
        let mut seen = HashSet::new();
        records
            .nodes
            .iter()
            .filter(|n| seen.insert(n.type_tag.as_str()))
            .map(|n| TypeDeclaration {
                type_tag: n.type_tag.clone(),
                properties: declared_properties(&n.type_tag),
            })
            .collect()
    }

    fn relation_catalog(&self, records: &LoadedRecords) -> Vec<RelationDeclaration> {
        let properties = declared_properties(RELATIONSHIP_TYPE);
        let mut seen = HashSet::new();
        records
            .edges
            .iter()
            .filter(|e| {
                seen.insert((
                    e.label.as_str(),
                    e.source_type.as_str(),
                    e.target_type.as_str(),
                ))
            })
            .map(|e| RelationDeclaration {
                label: e.label.clone(),
                source_tag: e.source_type.clone(),
                target_tag: e.target_type.clone(),
                properties: properties.clone(),
            })
            .collect()
    }

    fn endpoint_rule(&self) -> EndpointRule {
        EndpointRule::Both
    }

    fn relation_naming(&self) -> RelationNaming {
        RelationNaming::EndpointQualified
    }

    fn edge_load_mode(&self) -> EdgeLoadMode {
        EdgeLoadMode::BulkCopy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{infer_node_schema, infer_relation_schema};

    const BUNDLE: &str = r#"{
        "type": "bundle",
        "id": "bundle--5d0092c5-5f74-4287-9642-33f4c354e56d",
        "objects": [
            {
                "type": "identity",
                "spec_version": "2.1",
                "id": "identity--311b2d2d-f010-4473-83ec-1edf84858f4c",
                "created": "2015-12-21T19:59:11.000Z",
                "modified": "2015-12-21T19:59:11.000Z",
                "name": "Cole Powers",
                "identity_class": "individual"
            },
            {
                "type": "threat-actor",
                "spec_version": "2.1",
                "id": "threat-actor--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f",
                "created": "2016-04-06T20:03:48.000Z",
                "modified": "2016-04-06T20:03:48.000Z",
                "name": "Evil Org",
                "aliases": ["Syndicate 1", "Evil Syndicate 99"],
                "confidence": 80
            },
            {
                "type": "relationship",
                "spec_version": "2.1",
                "id": "relationship--a2e3efb5-351d-4d46-97a0-6897ee7c77a0",
                "created": "2020-02-29T18:03:58.029Z",
                "modified": "2020-02-29T18:03:58.029Z",
                "relationship_type": "attributed-to",
                "source_ref": "threat-actor--8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f",
                "target_ref": "identity--311b2d2d-f010-4473-83ec-1edf84858f4c"
            }
        ]
    }"#;

    fn adapter(content: &str, policy: DanglingReferencePolicy) -> StixAdapter {
        StixAdapter::new(
            &StixSpecification {
                file_content: content.to_string(),
            },
            policy,
        )
    }

    #[test]
    fn test_bundle_to_records() {
        let stix = adapter(BUNDLE, DanglingReferencePolicy::Skip);
        let records = stix.load().unwrap();
        assert_eq!(records.nodes.len(), 2);
        assert_eq!(records.edges.len(), 1);

        let edge = &records.edges[0];
        assert_eq!(edge.source_type, "threat-actor");
        assert_eq!(edge.target_type, "identity");
        assert_eq!(edge.label, "attributed-to");

        let nodes = infer_node_schema(&stix.type_catalog(&records)).unwrap();
        let relations = infer_relation_schema(
            &stix.relation_catalog(&records),
            &nodes,
            stix.relation_naming(),
        )
        .unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].name, "ThreatActor_attributed_to_Identity");
        assert!(relations[0].column("relationship_type").is_some());
    }

    #[test]
    fn test_unsupported_properties_are_omitted() {
        let stix = adapter(BUNDLE, DanglingReferencePolicy::Skip);
        let records = stix.load().unwrap();
        let actor = records
            .nodes
            .iter()
            .find(|n| n.type_tag == "threat-actor")
            .unwrap();
        assert!(!actor.properties.contains_key("aliases"));
        assert!(!actor.properties.contains_key("type"));
        assert_eq!(actor.get("confidence"), &Value::Int32(80));
        assert!(matches!(actor.get("created"), Value::Timestamp(_)));

        let nodes = infer_node_schema(&stix.type_catalog(&records)).unwrap();
        assert!(nodes["threat-actor"].column("aliases").is_none());
        assert!(nodes["identity"].column("identity_class").is_none());
    }

    #[test]
    fn test_data_url_content() {
        let url = format!(
            "data:application/json;base64,{}",
            STANDARD.encode(BUNDLE.as_bytes())
        );
        let records = adapter(&url, DanglingReferencePolicy::Skip).load().unwrap();
        assert_eq!(records.nodes.len(), 2);

        let err = adapter("data:application/json;base64,@@@", DanglingReferencePolicy::Skip)
            .load()
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidSource(_)));
    }

    #[test]
    fn test_dangling_reference_policy() {
        let objects = r#"[
            {"type": "malware", "id": "malware--1", "name": "Poison Ivy", "is_family": true},
            {"type": "relationship", "id": "relationship--1", "relationship_type": "uses",
             "source_ref": "intrusion-set--absent", "target_ref": "malware--1"}
        ]"#;
        let records = adapter(objects, DanglingReferencePolicy::Skip)
            .load()
            .unwrap();
        assert_eq!(records.nodes.len(), 1);
        assert!(records.edges.is_empty());
        assert_eq!(records.relation_labels, vec!["uses".to_string()]);

        let err = adapter(objects, DanglingReferencePolicy::Fail)
            .load()
            .unwrap_err();
        assert!(matches!(err, IngestError::DataLoadFailure { .. }));
    }

    #[test]
    fn test_latest_version_wins() {
        let objects = r#"[
            {"type": "tool", "id": "tool--1", "modified": "2020-01-01T00:00:00Z", "name": "v2"},
            {"type": "tool", "id": "tool--1", "modified": "2019-01-01T00:00:00Z", "name": "v1"}
        ]"#;
        let records = adapter(objects, DanglingReferencePolicy::Skip)
            .load()
            .unwrap();
        assert_eq!(records.nodes.len(), 1);
        assert_eq!(records.nodes[0].get("name"), &Value::String("v2".into()));
    }

    #[test]
    fn test_mistyped_value_is_ignored() {
        let object = r#"{"type": "indicator", "id": "indicator--1", "confidence": "high", "name": "bad"}"#;
        let records = adapter(object, DanglingReferencePolicy::Skip).load().unwrap();
        assert_eq!(records.nodes[0].get("confidence"), &Value::Null);
        assert_eq!(records.nodes[0].get("name"), &Value::String("bad".into()));
    }

    #[test]
    fn test_malformed_document() {
        for content in ["not json", "42", r#"{"type": "bundle", "objects": {}}"#, r#"[{"id": "x"}]"#] {
            let err = adapter(content, DanglingReferencePolicy::Skip)
                .load()
                .unwrap_err();
            assert!(matches!(err, IngestError::InvalidSource(_)), "{content}: {err}");
        }
    }
}
