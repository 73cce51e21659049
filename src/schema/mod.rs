//! Static type, method and field descriptors.
//!
//! This module handles:
//! - The node arena (`TypeNode`, `MethodNode`, `DataNode`)
//! - Method signature parsing
//! - The resolver service that synthesizes undeclared nodes

pub mod nodes;
pub mod resolver;
pub mod signature;

// Re-export main types
pub use nodes::{DataId, DataNode, MethodId, MethodNode, TypeId, TypeKind, TypeNode};
pub use resolver::{SchemaTable, StaticResolver, TypeDeclaration};
pub use signature::{MethodKey, MethodSignature};
