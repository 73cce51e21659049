//! Contour records stored in the contour arena.

use super::member::ContourMember;
use crate::schema::{MethodId, TypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-internal contour identity; doubles as the arena index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContourId(pub(crate) u64);

impl ContourId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "contour#{}", self.0)
    }
}

/// Object identifier shared by every level of an instance chain
pub type Oid = u64;

/// The three contour kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContourKind {
    Static {
        type_id: TypeId,
    },
    Instance {
        type_id: TypeId,
        oid: Oid,
        /// More-derived level of the same object, if any
        child: Option<ContourId>,
        array: bool,
    },
    Method {
        method_id: MethodId,
        thread: String,
    },
}

/// A runtime environment instance
#[derive(Debug, Clone)]
pub struct Contour {
    pub(crate) id: ContourId,
    pub(crate) ordinal: u64,
    pub(crate) parent: Option<ContourId>,
    pub(crate) kind: ContourKind,
    pub(crate) members: Vec<ContourMember>,
}

impl Contour {
    pub fn id(&self) -> ContourId {
        self.id
    }

    /// Human-facing sequence number within the contour's category
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn parent(&self) -> Option<ContourId> {
        self.parent
    }

    pub fn kind(&self) -> &ContourKind {
        &self.kind
    }

    pub fn members(&self) -> &[ContourMember] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&ContourMember> {
        self.members.get(index)
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name() == name)
    }

    /// Members passing the active slice; exempt members are always kept
    pub fn visible_members<'a>(
        &'a self,
        slice: Option<&dyn Fn(&ContourMember) -> bool>,
    ) -> Vec<&'a ContourMember> {
        self.members
            .iter()
            .filter(|m| m.is_slice_exempt() || slice.map_or(true, |keep| keep(*m)))
            .collect()
    }

    pub fn child_instance(&self) -> Option<ContourId> {
        match self.kind {
            ContourKind::Instance { child, .. } => child,
            _ => None,
        }
    }

    /// An instance level is virtual iff a more-derived level exists.
    pub fn is_virtual(&self) -> bool {
        self.child_instance().is_some()
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, ContourKind::Static { .. })
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, ContourKind::Instance { .. })
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, ContourKind::Method { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ContourKind::Instance { array: true, .. })
    }

    pub fn oid(&self) -> Option<Oid> {
        match self.kind {
            ContourKind::Instance { oid, .. } => Some(oid),
            _ => None,
        }
    }

    /// Type the contour instantiates (static and instance contours)
    pub fn type_id(&self) -> Option<TypeId> {
        match self.kind {
            ContourKind::Static { type_id } | ContourKind::Instance { type_id, .. } => Some(type_id),
            ContourKind::Method { .. } => None,
        }
    }

    pub fn method_id(&self) -> Option<MethodId> {
        match self.kind {
            ContourKind::Method { method_id, .. } => Some(method_id),
            _ => None,
        }
    }

    pub fn thread(&self) -> Option<&str> {
        match &self.kind {
            ContourKind::Method { thread, .. } => Some(thread),
            _ => None,
        }
    }
}
