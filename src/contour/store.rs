//! Contour arena with per-kind indices and identity counters.
//!
//! Every contour lives in one `Vec`; parents and instance children are
//! plain ids into it. Static contours are indexed by type name, instance
//! levels by `(level type name, oid)`.

use super::member::{ContourMember, Value};
use super::record::{Contour, ContourId, ContourKind, Oid};
use crate::schema::{MethodId, StaticResolver, TypeId, TypeKind, TypeNode};
use crate::utils::error::ContourError;
use log::debug;
use std::collections::HashMap;

/// Identity and ordinal counters, owned per store
#[derive(Debug, Default)]
struct Counters {
    next_id: u64,
    /// One sequence shared by all static contours (load order)
    static_ordinal: u64,
    /// Keyed by concrete type name
    instance_ordinals: HashMap<String, u64>,
    method_ordinals: HashMap<MethodId, u64>,
}

impl Counters {
    fn next_id(&mut self) -> ContourId {
        let id = ContourId(self.next_id);
        self.next_id += 1;
        id
    }

    fn next_static(&mut self) -> u64 {
        self.static_ordinal += 1;
        self.static_ordinal
    }

    fn next_instance(&mut self, type_name: &str) -> u64 {
        let counter = self.instance_ordinals.entry(type_name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    fn next_method(&mut self, method: MethodId) -> u64 {
        let counter = self.method_ordinals.entry(method).or_insert(0);
        *counter += 1;
        *counter
    }
}

/// Owns every contour of one model
///
/// The store takes `&mut self` for all creation; sharing it between
/// builders requires an outer lock.
#[derive(Debug, Default)]
pub struct ContourStore {
    contours: Vec<Contour>,
    counters: Counters,
    statics: HashMap<String, ContourId>,
    instances: HashMap<(String, Oid), ContourId>,
}

impl ContourStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// All contours in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter()
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    /// Number of objects, counting each instance chain once
    pub fn object_count(&self) -> usize {
        self.contours
            .iter()
            .filter(|c| c.is_instance() && !c.is_virtual())
            .count()
    }

    pub fn method_count(&self) -> usize {
        self.contours.iter().filter(|c| c.is_method()).count()
    }

    /// Create static contours for `type_id` and all its ancestors
    ///
    /// Returns only the contours created by this call, root-most first.
    /// Already loaded levels are skipped, so a second call returns an empty
    /// list.
    pub fn ensure_static_chain<R: StaticResolver + ?Sized>(
        &mut self,
        type_id: TypeId,
        resolver: &R,
    ) -> Result<Vec<ContourId>, ContourError> {
        let chain = ancestry(type_id, resolver)?;
        let mut created = Vec::new();
        let mut parent = None;

        for level in chain {
            let node = type_node(resolver, level)?;
            if let Some(&existing) = self.statics.get(&node.name) {
                parent = Some(existing);
                continue;
            }

            let members = node
                .fields
                .iter()
                .filter_map(|&d| resolver.data_node(d))
                .filter(|d| d.is_static)
                .map(ContourMember::field)
                .collect();

            let ordinal = self.counters.next_static();
            let id = self.push(parent, ordinal, ContourKind::Static { type_id: level }, members);
            self.statics.insert(node.name.clone(), id);
            debug!("Loaded static contour {} for {}", id, node.name);

            created.push(id);
            parent = Some(id);
        }

        Ok(created)
    }

    /// Static contour for `type_id`, creating it (and its ancestors) on first use
    ///
    /// Returns `None` if the resolver has no node for `type_id`.
    pub fn create_static_contour<R: StaticResolver + ?Sized>(
        &mut self,
        type_id: TypeId,
        resolver: &R,
    ) -> Option<ContourId> {
        let name = resolver.type_node(type_id)?.name.clone();
        self.ensure_static_chain(type_id, resolver).ok()?;
        self.statics.get(&name).copied()
    }

    /// Instance chain for an object of `type_id`
    ///
    /// Returns the existing `(type name, oid)` level if one is indexed;
    /// otherwise builds every level from the root type down to `type_id`
    /// and returns the concrete (most-derived) level.
    pub fn create_instance_contour<R: StaticResolver + ?Sized>(
        &mut self,
        type_id: TypeId,
        oid: Oid,
        resolver: &R,
    ) -> Result<ContourId, ContourError> {
        let node = type_node(resolver, type_id)?;
        if !node.kind.is_instantiable() {
            return Err(ContourError::NotInstantiable(node.name.clone()));
        }
        if let Some(existing) = self.lookup_instance_contour(&node.name, oid) {
            return Ok(existing);
        }
        if node.kind == TypeKind::Array {
            return self.create_array_contour(type_id, oid, 0, resolver);
        }

        let concrete_name = node.name.clone();
        self.ensure_static_chain(type_id, resolver)?;

        let ordinal = self.counters.next_instance(&concrete_name);
        let mut previous = None;
        for level in ancestry(type_id, resolver)? {
            let level_node = type_node(resolver, level)?;
            let members = level_node
                .fields
                .iter()
                .filter_map(|&d| resolver.data_node(d))
                .filter(|d| !d.is_static)
                .map(ContourMember::field)
                .collect();

            previous = Some(self.push_instance_level(previous, level_node, oid, ordinal, false, members));
        }

        let concrete = previous.ok_or_else(|| ContourError::UnknownType(concrete_name.clone()))?;
        debug!("Created instance chain {}@{:#x} -> {}", concrete_name, oid, concrete);
        Ok(concrete)
    }

    /// Two-level chain for an array: root object level plus one concrete
    /// level holding `length` cells that share the element schema.
    pub fn create_array_contour<R: StaticResolver + ?Sized>(
        &mut self,
        type_id: TypeId,
        oid: Oid,
        length: usize,
        resolver: &R,
    ) -> Result<ContourId, ContourError> {
        let node = type_node(resolver, type_id)?;
        if node.kind != TypeKind::Array {
            return Err(ContourError::NotInstantiable(node.name.clone()));
        }
        if let Some(existing) = self.lookup_instance_contour(&node.name, oid) {
            return Ok(existing);
        }

        self.ensure_static_chain(type_id, resolver)?;

        let root = node
            .superclass
            .map(|s| type_node(resolver, s))
            .transpose()?;
        let (element, element_name) = match node.element.and_then(|e| resolver.type_node(e)) {
            Some(elem) => (elem.id, elem.name.clone()),
            None => (type_id, node.name.clone()),
        };

        let ordinal = self.counters.next_instance(&node.name);
        let root_level = match root {
            Some(root) => {
                let members = root
                    .fields
                    .iter()
                    .filter_map(|&d| resolver.data_node(d))
                    .filter(|d| !d.is_static)
                    .map(ContourMember::field)
                    .collect();
                Some(self.push_instance_level(None, root, oid, ordinal, false, members))
            }
            None => None,
        };

        let cells = (0..length)
            .map(|i| ContourMember::array_cell(element, &element_name, i))
            .collect();
        let concrete = self.push_instance_level(root_level, node, oid, ordinal, true, cells);

        debug!("Created array {}@{:#x} with {} cells -> {}", node.name, oid, length, concrete);
        Ok(concrete)
    }

    /// New method contour for one invocation; never deduplicated
    pub fn create_method_contour<R: StaticResolver + ?Sized>(
        &mut self,
        context: ContourId,
        method_id: MethodId,
        thread: &str,
        resolver: &R,
    ) -> Result<ContourId, ContourError> {
        if self.get(context).is_none() {
            return Err(ContourError::UnknownContour(context));
        }
        let method = resolver
            .method_node(method_id)
            .ok_or_else(|| ContourError::UnknownMethod(method_id.to_string()))?;

        let mut members: Vec<ContourMember> = method
            .variables()
            .filter_map(|d| resolver.data_node(d))
            .map(ContourMember::variable)
            .collect();
        members.push(ContourMember::result(&method.return_type));
        members.push(ContourMember::rpdl());

        let ordinal = self.counters.next_method(method_id);
        let kind = ContourKind::Method {
            method_id,
            thread: thread.to_string(),
        };
        Ok(self.push(Some(context), ordinal, kind, members))
    }

    pub fn lookup_static_contour(&self, type_name: &str) -> Option<ContourId> {
        self.statics.get(type_name).copied()
    }

    pub fn lookup_instance_contour(&self, type_name: &str, oid: Oid) -> Option<ContourId> {
        self.instances.get(&(type_name.to_string(), oid)).copied()
    }

    pub fn retrieve_static_contour(&self, type_name: &str) -> Result<ContourId, ContourError> {
        self.lookup_static_contour(type_name)
            .ok_or_else(|| ContourError::StaticNotFound(type_name.to_string()))
    }

    pub fn retrieve_instance_contour(&self, type_name: &str, oid: Oid) -> Result<ContourId, ContourError> {
        self.lookup_instance_contour(type_name, oid)
            .ok_or_else(|| ContourError::InstanceNotFound {
                type_name: type_name.to_string(),
                oid,
            })
    }

    /// Most-derived level of the instance chain containing `id`
    pub fn concrete_contour(&self, id: ContourId) -> ContourId {
        let mut current = id;
        while let Some(child) = self.get(current).and_then(Contour::child_instance) {
            current = child;
        }
        current
    }

    /// Levels of the chain ending at `concrete`, root-most first
    pub fn instance_chain(&self, concrete: ContourId) -> Vec<ContourId> {
        let mut chain = Vec::new();
        let mut current = Some(concrete);
        while let Some(id) = current {
            let Some(contour) = self.get(id).filter(|c| c.is_instance()) else {
                break;
            };
            chain.push(id);
            current = contour.parent();
        }
        chain.reverse();
        chain
    }

    /// Find a member by name, checking `start` and then each parent
    ///
    /// Returns the contour that owns the slot and the slot index.
    pub fn find_member(&self, start: ContourId, name: &str) -> Option<(ContourId, usize)> {
        let mut current = Some(start);
        while let Some(id) = current {
            let contour = self.get(id)?;
            if let Some(index) = contour.member_index(name) {
                return Some((id, index));
            }
            current = contour.parent();
        }
        None
    }

    /// Append a member slot to an existing contour, returning its index
    pub fn add_member(&mut self, id: ContourId, member: ContourMember) -> Result<usize, ContourError> {
        let contour = self
            .contours
            .get_mut(id.0 as usize)
            .ok_or(ContourError::UnknownContour(id))?;
        contour.members.push(member);
        Ok(contour.members.len() - 1)
    }

    /// Write a member slot, returning the value it held
    pub fn replace_member(&mut self, id: ContourId, index: usize, value: Value) -> Option<Value> {
        self.contours
            .get_mut(id.0 as usize)?
            .members
            .get_mut(index)
            .map(|member| member.replace(value))
    }

    fn push(
        &mut self,
        parent: Option<ContourId>,
        ordinal: u64,
        kind: ContourKind,
        members: Vec<ContourMember>,
    ) -> ContourId {
        let id = self.counters.next_id();
        debug_assert_eq!(id.0 as usize, self.contours.len());
        self.contours.push(Contour {
            id,
            ordinal,
            parent,
            kind,
            members,
        });
        id
    }

    fn push_instance_level(
        &mut self,
        parent: Option<ContourId>,
        node: &TypeNode,
        oid: Oid,
        ordinal: u64,
        array: bool,
        members: Vec<ContourMember>,
    ) -> ContourId {
        let kind = ContourKind::Instance {
            type_id: node.id,
            oid,
            child: None,
            array,
        };
        let id = self.push(parent, ordinal, kind, members);

        if let Some(ContourKind::Instance { child, .. }) = parent
            .and_then(|p| self.contours.get_mut(p.0 as usize))
            .map(|c| &mut c.kind)
        {
            *child = Some(id);
        }

        // An oid already bound at this level belongs to a live chain of
        // another concrete type; keep that binding
        self.instances.entry((node.name.clone(), oid)).or_insert(id);
        id
    }
}

fn type_node<R: StaticResolver + ?Sized>(resolver: &R, id: TypeId) -> Result<&TypeNode, ContourError> {
    resolver
        .type_node(id)
        .ok_or_else(|| ContourError::UnknownType(id.to_string()))
}

/// Superclass chain of `type_id`, root-most first
fn ancestry<R: StaticResolver + ?Sized>(type_id: TypeId, resolver: &R) -> Result<Vec<TypeId>, ContourError> {
    let mut chain = Vec::new();
    let mut current = Some(type_id);

    while let Some(id) = current {
        // Guard against cyclic superclass declarations
        if chain.contains(&id) {
            break;
        }
        let node = type_node(resolver, id)?;
        chain.push(id);
        current = node.superclass;
    }

    chain.reverse();
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaTable;
    use crate::utils::config::{RESULT_MEMBER, ROOT_TYPE, RPDL_MEMBER};

    fn hierarchy() -> (SchemaTable, TypeId) {
        let mut table = SchemaTable::new();
        table.declare_type("Base", TypeKind::Class, None);
        let derived = table.declare_type("Derived", TypeKind::Class, Some("Base"));
        (table, derived)
    }

    #[test]
    fn test_static_chain_loads_ancestors_first() {
        let (table, derived) = hierarchy();
        let mut store = ContourStore::new();

        let created = store.ensure_static_chain(derived, &table).unwrap();
        assert_eq!(created.len(), 3);

        let root = store.get(created[0]).unwrap();
        assert!(root.parent().is_none());
        assert_eq!(store.lookup_static_contour(ROOT_TYPE), Some(created[0]));
        assert_eq!(store.get(created[2]).unwrap().parent(), Some(created[1]));

        assert!(store.ensure_static_chain(derived, &table).unwrap().is_empty());
    }

    #[test]
    fn test_static_contour_is_singleton_with_global_ordinals() {
        let (mut table, derived) = hierarchy();
        let mut store = ContourStore::new();

        let first = store.create_static_contour(derived, &table).unwrap();
        let again = store.create_static_contour(derived, &table).unwrap();
        assert_eq!(first, again);
        assert_eq!(store.get(first).unwrap().ordinal(), 3);

        let other = table.resolve_type("Other");
        let other_static = store.create_static_contour(other, &table).unwrap();
        assert_eq!(store.get(other_static).unwrap().ordinal(), 4);
    }

    #[test]
    fn test_create_static_contour_unknown_type() {
        let table = SchemaTable::new();
        let mut store = ContourStore::new();
        assert!(store.create_static_contour(TypeId(42), &table).is_none());
    }

    #[test]
    fn test_retrieve_signals_not_found() {
        let store = ContourStore::new();
        assert_eq!(
            store.retrieve_instance_contour("Foo", 0x10),
            Err(ContourError::InstanceNotFound {
                type_name: "Foo".to_string(),
                oid: 0x10
            })
        );
        assert!(store.lookup_static_contour("Foo").is_none());
        assert!(store.retrieve_static_contour("Foo").is_err());
    }

    #[test]
    fn test_method_contour_reserved_members_last() {
        let mut table = SchemaTable::new();
        let foo = table.declare_type("Foo", TypeKind::Class, None);
        let run = table.declare_method(foo, "run", &[("a", "int")], &[("tmp", "long")], "int");
        let mut store = ContourStore::new();
        let context = store.create_static_contour(foo, &table).unwrap();

        let first = store.create_method_contour(context, run, "1", &table).unwrap();
        let second = store.create_method_contour(context, run, "1", &table).unwrap();
        assert_ne!(first, second);

        let contour = store.get(second).unwrap();
        let names: Vec<&str> = contour.members().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["a", "tmp", RESULT_MEMBER, RPDL_MEMBER]);
        assert_eq!(contour.ordinal(), 2);
        assert_eq!(contour.parent(), Some(context));
        assert_eq!(contour.thread(), Some("1"));
    }
}
