//! Static resolver service and its in-memory implementation.
//!
//! The builder never owns declaration tables; it asks a [`StaticResolver`]
//! for nodes by key and the resolver synthesizes nodes for anything the
//! trace mentions but no declaration covers.

use super::nodes::{DataId, DataNode, MethodId, MethodNode, TypeId, TypeKind, TypeNode};
use super::signature::MethodKey;
use crate::utils::config::{PRIMITIVE_TYPES, ROOT_TYPE};
use crate::utils::error::ParseError;
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Lookup service for static type, method and field descriptors
///
/// The `resolve_*` operations never fail: unknown keys produce synthesized
/// nodes. Node accessors return `None` only for ids the resolver never
/// handed out.
pub trait StaticResolver {
    fn resolve_type(&mut self, key: &str) -> TypeId;
    fn resolve_method(&mut self, owner: TypeId, key: &str) -> MethodId;
    fn resolve_field(&mut self, owner: TypeId, name: &str, is_static: bool) -> DataId;

    fn lookup_type(&self, name: &str) -> Option<TypeId>;
    fn type_node(&self, id: TypeId) -> Option<&TypeNode>;
    fn method_node(&self, id: MethodId) -> Option<&MethodNode>;
    fn data_node(&self, id: DataId) -> Option<&DataNode>;
}

/// One type entry of a declarations file
#[derive(Debug, Clone, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,
    #[serde(default)]
    pub params: Vec<VariableDeclaration>,
    #[serde(default)]
    pub locals: Vec<VariableDeclaration>,
    #[serde(default = "default_return_type")]
    pub returns: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

fn default_return_type() -> String {
    "void".to_string()
}

/// Arena-backed declaration tables
#[derive(Debug, Default)]
pub struct SchemaTable {
    types: Vec<TypeNode>,
    methods: Vec<MethodNode>,
    data: Vec<DataNode>,
    type_index: HashMap<String, TypeId>,
    method_index: HashMap<(TypeId, String), MethodId>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build tables from parsed declarations
    pub fn from_declarations(declarations: &[TypeDeclaration]) -> Self {
        let mut table = Self::new();

        // Types first so that superclass and member types resolve to
        // declared nodes regardless of file order
        for decl in declarations {
            table.declare_type(&decl.name, decl.kind, None);
        }

        for decl in declarations {
            let owner = table.declare_type(&decl.name, decl.kind, decl.superclass.as_deref());

            for field in &decl.fields {
                table.declare_field(owner, &field.name, &field.type_name, field.is_static);
            }

            for method in &decl.methods {
                let params: Vec<(&str, &str)> = method
                    .params
                    .iter()
                    .map(|v| (v.name.as_str(), v.type_name.as_str()))
                    .collect();
                let locals: Vec<(&str, &str)> = method
                    .locals
                    .iter()
                    .map(|v| (v.name.as_str(), v.type_name.as_str()))
                    .collect();
                table.declare_method(owner, &method.name, &params, &locals, &method.returns);
            }
        }

        table
    }

    /// Load a JSON declarations file
    ///
    /// **Public** - used by the build command for `--declarations`
    ///
    /// # Errors
    /// * `ParseError::IoError` - file cannot be read
    /// * `ParseError::JsonError` - file is not a JSON array of declarations
    pub fn load_declarations(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        debug!("Loading declarations from: {}", path.display());

        let text = std::fs::read_to_string(path)?;
        let declarations: Vec<TypeDeclaration> = serde_json::from_str(&text)?;
        let table = Self::from_declarations(&declarations);

        info!(
            "Loaded {} types, {} methods from {}",
            table.types.len(),
            table.methods.len(),
            path.display()
        );

        Ok(table)
    }

    /// Declare (or redeclare) a type
    ///
    /// Class and enum types without an explicit superclass extend the root
    /// type. Redeclaring replaces the kind and superclass of a node created
    /// earlier, including synthesized ones.
    pub fn declare_type(&mut self, name: &str, kind: TypeKind, superclass: Option<&str>) -> TypeId {
        let superclass = match superclass {
            Some(parent) => Some(self.resolve_type(parent)),
            None => self.default_superclass(name, kind),
        };

        if let Some(&id) = self.type_index.get(name) {
            let node = &mut self.types[id.0];
            node.kind = kind;
            node.superclass = superclass;
            node.synthetic = false;
            return id;
        }

        let element = match kind {
            TypeKind::Array => name.strip_suffix("[]").map(|elem| self.resolve_type(elem)),
            _ => None,
        };

        self.insert_type(name, kind, superclass, element, false)
    }

    pub fn declare_field(&mut self, owner: TypeId, name: &str, type_name: &str, is_static: bool) -> DataId {
        let index = self.types[owner.0].fields.len();
        let id = self.insert_data(name, type_name, is_static, index);
        self.types[owner.0].fields.push(id);
        id
    }

    pub fn declare_method(
        &mut self,
        owner: TypeId,
        name: &str,
        params: &[(&str, &str)],
        locals: &[(&str, &str)],
        return_type: &str,
    ) -> MethodId {
        let key = MethodKey {
            name: name.to_string(),
            params: params.iter().map(|(_, ty)| ty.to_string()).collect(),
            return_type: return_type.to_string(),
        };
        self.insert_method(owner, &key, params, locals, false)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    fn default_superclass(&mut self, name: &str, kind: TypeKind) -> Option<TypeId> {
        match kind {
            TypeKind::Class | TypeKind::Enum | TypeKind::Array if name != ROOT_TYPE => {
                Some(self.resolve_type(ROOT_TYPE))
            }
            _ => None,
        }
    }

    fn insert_type(
        &mut self,
        name: &str,
        kind: TypeKind,
        superclass: Option<TypeId>,
        element: Option<TypeId>,
        synthetic: bool,
    ) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(TypeNode {
            id,
            name: name.to_string(),
            kind,
            superclass,
            element,
            fields: Vec::new(),
            methods: Vec::new(),
            synthetic,
        });
        self.type_index.insert(name.to_string(), id);
        id
    }

    fn insert_data(&mut self, name: &str, type_name: &str, is_static: bool, index: usize) -> DataId {
        let id = DataId(self.data.len());
        self.data.push(DataNode {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            is_static,
            index,
        });
        id
    }

    fn insert_method(
        &mut self,
        owner: TypeId,
        key: &MethodKey,
        params: &[(&str, &str)],
        locals: &[(&str, &str)],
        synthetic: bool,
    ) -> MethodId {
        let params = params
            .iter()
            .enumerate()
            .map(|(i, (name, ty))| self.insert_data(name, ty, false, i))
            .collect();
        let locals = locals
            .iter()
            .enumerate()
            .map(|(i, (name, ty))| self.insert_data(name, ty, false, i))
            .collect();

        let id = MethodId(self.methods.len());
        let key_text = key.to_string();
        self.methods.push(MethodNode {
            id,
            owner,
            name: key.name.clone(),
            key: key_text.clone(),
            params,
            locals,
            return_type: key.return_type.clone(),
            synthetic,
        });
        self.types[owner.0].methods.push(id);
        self.method_index.insert((owner, key_text), id);
        id
    }

    fn synthesize_type(&mut self, key: &str) -> TypeId {
        debug!("Synthesizing type node for {}", key);

        if let Some(elem) = key.strip_suffix("[]") {
            let element = self.resolve_type(elem);
            let root = self.resolve_type(ROOT_TYPE);
            return self.insert_type(key, TypeKind::Array, Some(root), Some(element), true);
        }

        if PRIMITIVE_TYPES.contains(&key) {
            return self.insert_type(key, TypeKind::Primitive, None, None, true);
        }

        let superclass = (key != ROOT_TYPE).then(|| self.resolve_type(ROOT_TYPE));
        self.insert_type(key, TypeKind::Class, superclass, None, true)
    }
}

impl StaticResolver for SchemaTable {
    fn resolve_type(&mut self, key: &str) -> TypeId {
        let key = key.trim();
        match self.type_index.get(key) {
            Some(&id) => id,
            None => self.synthesize_type(key),
        }
    }

    fn resolve_method(&mut self, owner: TypeId, key: &str) -> MethodId {
        if let Some(&id) = self.method_index.get(&(owner, key.to_string())) {
            return id;
        }

        let parsed = MethodKey::parse(key).unwrap_or_else(|| MethodKey {
            name: key.to_string(),
            params: Vec::new(),
            return_type: "void".to_string(),
        });

        // Declarations may spell parameter types differently from the trace;
        // fall back to name and arity before inventing a node
        let by_arity = self.types[owner.0].methods.iter().copied().find(|m| {
            let node = &self.methods[m.0];
            node.name == parsed.name && node.params.len() == parsed.params.len()
        });
        if let Some(id) = by_arity {
            self.method_index.insert((owner, key.to_string()), id);
            return id;
        }

        debug!("Synthesizing method node {} on {}", parsed, self.types[owner.0].name);
        let names: Vec<String> = (0..parsed.params.len()).map(|i| format!("arg{i}")).collect();
        let params: Vec<(&str, &str)> = names
            .iter()
            .zip(parsed.params.iter())
            .map(|(n, t)| (n.as_str(), t.as_str()))
            .collect();
        let id = self.insert_method(owner, &parsed, &params, &[], true);
        self.method_index.insert((owner, key.to_string()), id);
        id
    }

    fn resolve_field(&mut self, owner: TypeId, name: &str, is_static: bool) -> DataId {
        let existing = self.types[owner.0]
            .fields
            .iter()
            .copied()
            .find(|d| self.data[d.0].name == name && self.data[d.0].is_static == is_static);
        if let Some(id) = existing {
            return id;
        }

        debug!("Synthesizing field {} on {}", name, self.types[owner.0].name);
        self.declare_field(owner, name, ROOT_TYPE, is_static)
    }

    fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    fn type_node(&self, id: TypeId) -> Option<&TypeNode> {
        self.types.get(id.0)
    }

    fn method_node(&self, id: MethodId) -> Option<&MethodNode> {
        self.methods.get(id.0)
    }

    fn data_node(&self, id: DataId) -> Option<&DataNode> {
        self.data.get(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_class_extends_root() {
        let mut table = SchemaTable::new();
        let foo = table.resolve_type("com.example.Foo");
        let node = table.type_node(foo).unwrap();

        assert_eq!(node.kind, TypeKind::Class);
        assert!(node.synthetic);

        let root = table.type_node(node.superclass.unwrap()).unwrap();
        assert_eq!(root.name, ROOT_TYPE);
        assert!(root.superclass.is_none());
    }

    #[test]
    fn test_synthesized_array_and_primitive() {
        let mut table = SchemaTable::new();
        let arr = table.resolve_type("int[]");
        let node = table.type_node(arr).unwrap();

        assert_eq!(node.kind, TypeKind::Array);
        let element = table.type_node(node.element.unwrap()).unwrap();
        assert_eq!(element.kind, TypeKind::Primitive);
    }

    #[test]
    fn test_resolve_method_is_stable() {
        let mut table = SchemaTable::new();
        let foo = table.resolve_type("Foo");
        let a = table.resolve_method(foo, "bar(int,long)void");
        let b = table.resolve_method(foo, "bar(int,long)void");

        assert_eq!(a, b);
        let node = table.method_node(a).unwrap();
        assert_eq!(node.params.len(), 2);
        assert_eq!(table.data_node(node.params[1]).unwrap().type_name, "long");
    }

    #[test]
    fn test_declared_method_matched_by_arity() {
        let mut table = SchemaTable::new();
        let foo = table.declare_type("Foo", TypeKind::Class, None);
        let declared = table.declare_method(foo, "bar", &[("x", "I")], &[("tmp", "int")], "void");

        assert_eq!(table.resolve_method(foo, "bar(int)void"), declared);
    }

    #[test]
    fn test_declarations_out_of_order() {
        let json = r#"[
            {"name": "B", "superclass": "A", "fields": [{"name": "y", "type": "int"}]},
            {"name": "A", "fields": [{"name": "count", "type": "int", "static": true}]}
        ]"#;
        let decls: Vec<TypeDeclaration> = serde_json::from_str(json).unwrap();
        let table = SchemaTable::from_declarations(&decls);

        let b = table.type_node(table.lookup_type("B").unwrap()).unwrap();
        let a = table.type_node(b.superclass.unwrap()).unwrap();
        assert_eq!(a.name, "A");
        assert!(!a.synthetic);
        assert_eq!(a.fields.len(), 1);
    }
}
