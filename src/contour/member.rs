//! Model values and contour member slots.

use super::record::ContourId;
use crate::schema::{DataId, DataNode, TypeId};
use crate::utils::config::{PRIMITIVE_TYPES, RPDL_MEMBER, RESULT_MEMBER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value held by a member slot or carried by a model event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    /// The system pseudo-caller
    System,
    /// Primitive value or opaque token, kept as the tracer wrote it
    Literal(String),
    Contour(ContourId),
}

impl Value {
    /// Zero value for a declared type: literals for primitives, null otherwise
    pub fn default_for(type_name: &str) -> Self {
        match type_name {
            "boolean" => Value::Literal("false".to_string()),
            "float" | "double" => Value::Literal("0.0".to_string()),
            "char" => Value::Literal("'\\0'".to_string()),
            "void" => Value::Null,
            name if PRIMITIVE_TYPES.contains(&name) => Value::Literal("0".to_string()),
            _ => Value::Null,
        }
    }

    pub fn as_contour(&self) -> Option<ContourId> {
        match self {
            Value::Contour(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::System => write!(f, "SYSTEM"),
            Value::Literal(text) => write!(f, "{text}"),
            Value::Contour(id) => write!(f, "{id}"),
        }
    }
}

/// Static origin of a member slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSchema {
    /// Declared or synthesized field of a static/instance contour
    Field(DataId),
    /// Parameter or local of a method contour
    Variable(DataId),
    /// Array element; every cell shares the element type as template
    ArrayCell { element: TypeId, index: usize },
    Result,
    Rpdl,
}

impl MemberSchema {
    /// Array cells and the RPDL slot are never hidden by an active slice.
    pub fn is_slice_exempt(self) -> bool {
        matches!(self, MemberSchema::ArrayCell { .. } | MemberSchema::Rpdl)
    }
}

/// A mutable named slot inside a contour
#[derive(Debug, Clone)]
pub struct ContourMember {
    name: String,
    schema: MemberSchema,
    default: Value,
    value: Option<Value>,
}

impl ContourMember {
    pub fn new(name: impl Into<String>, schema: MemberSchema, default: Value) -> Self {
        Self {
            name: name.into(),
            schema,
            default,
            value: None,
        }
    }

    pub fn field(node: &DataNode) -> Self {
        Self::new(&node.name, MemberSchema::Field(node.id), Value::default_for(&node.type_name))
    }

    pub fn variable(node: &DataNode) -> Self {
        Self::new(&node.name, MemberSchema::Variable(node.id), Value::default_for(&node.type_name))
    }

    pub fn array_cell(element: TypeId, element_type: &str, index: usize) -> Self {
        Self::new(
            format!("[{index}]"),
            MemberSchema::ArrayCell { element, index },
            Value::default_for(element_type),
        )
    }

    pub fn result(return_type: &str) -> Self {
        Self::new(RESULT_MEMBER, MemberSchema::Result, Value::default_for(return_type))
    }

    pub fn rpdl() -> Self {
        Self::new(RPDL_MEMBER, MemberSchema::Rpdl, Value::Null)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> MemberSchema {
        self.schema
    }

    /// Current value, or the schema default if never written
    pub fn value(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default)
    }

    pub fn is_written(&self) -> bool {
        self.value.is_some()
    }

    /// Store a new value and return the one it replaces
    pub fn replace(&mut self, value: Value) -> Value {
        self.value
            .replace(value)
            .unwrap_or_else(|| self.default.clone())
    }

    pub fn is_slice_exempt(&self) -> bool {
        self.schema.is_slice_exempt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_returns_default_then_previous() {
        let mut member = ContourMember::new("count", MemberSchema::Result, Value::default_for("int"));
        assert_eq!(member.value(), &Value::Literal("0".to_string()));
        assert!(!member.is_written());

        let old = member.replace(Value::Literal("5".to_string()));
        assert_eq!(old, Value::Literal("0".to_string()));

        let old = member.replace(Value::Null);
        assert_eq!(old, Value::Literal("5".to_string()));
        assert!(member.is_written());
    }

    #[test]
    fn test_reference_defaults_to_null() {
        assert_eq!(Value::default_for("java.lang.String"), Value::Null);
        assert_eq!(Value::default_for("boolean"), Value::Literal("false".to_string()));
    }
}
