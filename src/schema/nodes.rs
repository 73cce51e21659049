//! Static node descriptors for types, methods and data members.
//!
//! Nodes live in the resolver's arena and are referenced everywhere else by
//! small copyable ids.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_node_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the node in the resolver arena
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_node_id!(
    /// Identifies a [`TypeNode`]
    TypeId,
    "type#"
);
define_node_id!(
    /// Identifies a [`MethodNode`]
    MethodId,
    "method#"
);
define_node_id!(
    /// Identifies a [`DataNode`]
    DataId,
    "data#"
);

/// Kind of a static type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    #[default]
    Class,
    Array,
    Interface,
    Enum,
    Primitive,
}

impl TypeKind {
    /// Reference kinds get static contours; primitives never do.
    pub fn is_reference(self) -> bool {
        !matches!(self, TypeKind::Primitive)
    }

    /// Kinds that can back an instance contour chain
    pub fn is_instantiable(self) -> bool {
        matches!(self, TypeKind::Class | TypeKind::Enum | TypeKind::Array)
    }
}

/// Static descriptor of a type
#[derive(Debug, Clone)]
pub struct TypeNode {
    pub id: TypeId,
    pub name: String,
    pub kind: TypeKind,
    pub superclass: Option<TypeId>,
    /// Element type, arrays only
    pub element: Option<TypeId>,
    /// Declared fields, static and instance, in declaration order
    pub fields: Vec<DataId>,
    pub methods: Vec<MethodId>,
    /// True if the resolver invented this node because nothing declared it
    pub synthetic: bool,
}

/// Static descriptor of a method
#[derive(Debug, Clone)]
pub struct MethodNode {
    pub id: MethodId,
    pub owner: TypeId,
    pub name: String,
    /// Lookup key, `name(params)returnType`
    pub key: String,
    pub params: Vec<DataId>,
    pub locals: Vec<DataId>,
    pub return_type: String,
    pub synthetic: bool,
}

impl MethodNode {
    /// Parameters followed by locals, in declaration order
    pub fn variables(&self) -> impl Iterator<Item = DataId> + '_ {
        self.params.iter().chain(self.locals.iter()).copied()
    }
}

/// Static descriptor of a field, parameter or local variable
#[derive(Debug, Clone)]
pub struct DataNode {
    pub id: DataId,
    pub name: String,
    pub type_name: String,
    pub is_static: bool,
    /// Declared index within the owning table
    pub index: usize,
}
