//! Serializable model document: contour snapshot plus the event stream.
//!
//! This is the on-disk output of the `build` command. Readers must treat
//! the event list as authoritative; the contour snapshot reflects the
//! final member values after the last event.

use super::events::ModelEvent;
use crate::builder::BuildSummary;
use crate::contour::{ContourId, ContourKind, ContourStore, Oid, Value};
use crate::schema::{StaticResolver, TypeId};
use crate::utils::config::SCHEMA_VERSION;
use serde::{Deserialize, Serialize};

/// Top-level output document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Document format version
    pub version: String,

    /// RFC 3339 timestamp of the build
    pub generated_at: String,

    /// Trace file the model was built from
    pub source: String,

    pub summary: BuildSummary,

    pub contours: Vec<ContourRecord>,

    pub events: Vec<ModelEvent>,
}

/// One contour as written to the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourRecord {
    pub id: ContourId,
    pub ordinal: u64,

    /// `static`, `instance`, `array` or `method`
    pub kind: String,

    /// Type name, or the method key for method contours
    pub schema: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ContourId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<ContourId>,

    #[serde(rename = "virtual")]
    pub is_virtual: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oid: Option<Oid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,

    pub members: Vec<MemberRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub name: String,
    pub value: Value,
}

/// Snapshot every contour in creation order
pub fn snapshot_contours<R: StaticResolver + ?Sized>(
    store: &ContourStore,
    resolver: &R,
) -> Vec<ContourRecord> {
    store
        .iter()
        .map(|contour| {
            let (kind, schema) = match contour.kind() {
                ContourKind::Static { type_id } => ("static", type_name(resolver, *type_id)),
                ContourKind::Instance { type_id, array, .. } => {
                    let kind = if *array { "array" } else { "instance" };
                    (kind, type_name(resolver, *type_id))
                }
                ContourKind::Method { method_id, .. } => {
                    let schema = resolver
                        .method_node(*method_id)
                        .map(|m| format!("{}.{}", type_name(resolver, m.owner), m.key))
                        .unwrap_or_else(|| method_id.to_string());
                    ("method", schema)
                }
            };

            ContourRecord {
                id: contour.id(),
                ordinal: contour.ordinal(),
                kind: kind.to_string(),
                schema,
                parent: contour.parent(),
                child: contour.child_instance(),
                is_virtual: contour.is_virtual(),
                oid: contour.oid(),
                thread: contour.thread().map(str::to_string),
                members: contour
                    .members()
                    .iter()
                    .map(|m| MemberRecord {
                        name: m.name().to_string(),
                        value: m.value().clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Assemble the output document for one completed build
///
/// **Public** - main entry point for document generation
pub fn to_document<R: StaticResolver + ?Sized>(
    source: &str,
    summary: BuildSummary,
    store: &ContourStore,
    resolver: &R,
    events: Vec<ModelEvent>,
) -> ModelDocument {
    ModelDocument {
        version: SCHEMA_VERSION.to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        source: source.to_string(),
        summary,
        contours: snapshot_contours(store, resolver),
        events,
    }
}

fn type_name<R: StaticResolver + ?Sized>(resolver: &R, type_id: TypeId) -> String {
    resolver
        .type_node(type_id)
        .map(|node| node.name.clone())
        .unwrap_or_else(|| type_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaTable, TypeKind};
    use crate::utils::config::ROOT_TYPE;

    #[test]
    fn test_snapshot_marks_virtual_levels() {
        let mut table = SchemaTable::new();
        let foo = table.declare_type("Foo", TypeKind::Class, None);
        table.declare_field(foo, "count", "int", false);
        let mut store = ContourStore::new();
        let concrete = store.create_instance_contour(foo, 0x10, &table).unwrap();

        let records = snapshot_contours(&store, &table);
        let instances: Vec<&ContourRecord> = records.iter().filter(|r| r.kind == "instance").collect();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].schema, ROOT_TYPE);
        assert!(instances[0].is_virtual);
        assert_eq!(instances[0].child, Some(concrete));

        let foo_level = instances[1];
        assert!(!foo_level.is_virtual);
        assert_eq!(foo_level.oid, Some(0x10));
        assert_eq!(foo_level.members[0].name, "count");
        assert_eq!(foo_level.members[0].value, Value::Literal("0".to_string()));
    }

    #[test]
    fn test_document_carries_version() {
        let table = SchemaTable::new();
        let store = ContourStore::new();
        let doc = to_document("trace.jsonl", BuildSummary::default(), &store, &table, Vec::new());
        assert_eq!(doc.version, SCHEMA_VERSION);
        assert!(doc.contours.is_empty());
        assert!(chrono::DateTime::parse_from_rfc3339(&doc.generated_at).is_ok());
    }
}
