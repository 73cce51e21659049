//! Trace builder: folds raw trace records into contours and model events.
//!
//! The builder is a single-threaded, in-order fold. Each record may create
//! contours on demand (types and methods are not pre-declared) and emits one
//! or more model events, delivered to the sink in fixed-size batches.
//!
//! Event ordering guarantees:
//! - Type-load events for a newly materialized static chain come before any
//!   event that references the type.
//! - Per thread, method-exit events never outnumber open method calls.

use super::state::{RegionTable, ThreadState};
use crate::contour::{ContourId, ContourMember, ContourStore, MemberSchema, Oid, Value};
use crate::model::{
    EventBatcher, EventPayload, ModelSink, MonitorAction, ScopeAction, ThreadAction, ThreadRef,
};
use crate::parser::{parse_oid, RawEvent, RawEventKind};
use crate::schema::{MethodSignature, StaticResolver, TypeId, TypeKind};
use crate::utils::config::{
    CONSTRUCTOR_KEY, DEFAULT_BATCH_SIZE, OID_REMAP_MODULUS, OID_REMAP_MULTIPLIER, PRIMITIVE_TYPES,
    RESULT_MEMBER, SYSTEM_TAG, THREAD_ID_FIELD, THREAD_PRIORITY_FIELD, THREAD_SCHEDULER_FIELD, THREAD_TYPE,
};
use crate::utils::error::{BuildError, ContourError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Builder settings
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Events per sink batch
    pub batch_size: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Counters describing one completed build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub records: u64,
    pub emitted: u64,
    pub batches: u64,
    /// Records with an absent or unknown kind
    pub skipped: u64,
    pub duplicate_threads: u64,
    pub threads: u64,
    pub method_calls: u64,
    pub objects: u64,
    pub destroyed: u64,
}

/// Next candidate for a colliding object id: `oid * 7 + oid % 19`
///
/// Zero is a fixed point of the formula, so it steps to one instead.
pub fn remap_oid(oid: Oid) -> Oid {
    let next = oid
        .wrapping_mul(OID_REMAP_MULTIPLIER)
        .wrapping_add(oid % OID_REMAP_MODULUS);
    if next == oid {
        next.wrapping_add(1)
    } else {
        next
    }
}

/// Fold raw records into the store and sink in one call
///
/// **Public** - main entry point for the build command
///
/// # Errors
/// Any invariant violation in the trace aborts the build; events still
/// buffered at that point are not delivered.
pub fn build_model<R, S>(
    records: &[RawEvent],
    store: &mut ContourStore,
    resolver: &mut R,
    sink: &mut S,
    config: BuilderConfig,
) -> Result<BuildSummary, BuildError>
where
    R: StaticResolver + ?Sized,
    S: ModelSink + ?Sized,
{
    let mut builder = TraceBuilder::new(store, resolver, sink, config);
    builder.process_all(records)?;
    Ok(builder.finish())
}

/// Incremental trace-to-model builder
pub struct TraceBuilder<'a, R: StaticResolver + ?Sized, S: ModelSink + ?Sized> {
    store: &'a mut ContourStore,
    resolver: &'a mut R,
    sink: &'a mut S,
    batcher: EventBatcher,
    threads: HashMap<String, ThreadState>,
    regions: RegionTable,
    /// Raw object id -> concrete contour of the live object it names
    objects: HashMap<Oid, ContourId>,
    summary: BuildSummary,
}

impl<'a, R, S> TraceBuilder<'a, R, S>
where
    R: StaticResolver + ?Sized,
    S: ModelSink + ?Sized,
{
    pub fn new(
        store: &'a mut ContourStore,
        resolver: &'a mut R,
        sink: &'a mut S,
        config: BuilderConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            sink,
            batcher: EventBatcher::new(config.batch_size),
            threads: HashMap::new(),
            regions: RegionTable::default(),
            objects: HashMap::new(),
            summary: BuildSummary::default(),
        }
    }

    /// Process records in order, stopping at the first fatal one
    pub fn process_all<'r>(
        &mut self,
        records: impl IntoIterator<Item = &'r RawEvent>,
    ) -> Result<(), BuildError> {
        for record in records {
            self.process(record)?;
        }
        Ok(())
    }

    /// Process one record
    pub fn process(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        self.summary.records += 1;
        self.dispatch(record).map_err(|e| {
            error!("Aborting import at record {}: {}", record, e);
            e
        })
    }

    /// Deliver the final partial batch and return the run's counters
    pub fn finish(mut self) -> BuildSummary {
        self.batcher.flush(&mut *self.sink);
        self.summary.emitted = self.batcher.emitted();
        self.summary.batches = self.batcher.batches();

        info!(
            "Built model: {} records, {} events in {} batches, {} skipped",
            self.summary.records, self.summary.emitted, self.summary.batches, self.summary.skipped
        );
        self.summary
    }

    pub fn summary(&self) -> &BuildSummary {
        &self.summary
    }

    /// Open method calls on `thread`
    pub fn call_depth(&self, thread: &str) -> usize {
        self.threads.get(&thread_key(thread)).map_or(0, |t| t.call_stack.len())
    }

    pub fn current_region(&self, thread: &str) -> Option<&str> {
        self.threads.get(&thread_key(thread))?.current_region.as_deref()
    }

    fn dispatch(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        match &record.kind {
            RawEventKind::FieldWrite => self.field_write(record),
            RawEventKind::MethodCall => self.method_call(record),
            RawEventKind::MethodEntered => {
                self.emit(record, EventPayload::MethodEntered);
                Ok(())
            }
            RawEventKind::MethodExit => self.method_exit(record),
            RawEventKind::MonitorLockBegin => self.monitor(record, MonitorAction::LockBegin),
            RawEventKind::MonitorLockEnd => self.monitor(record, MonitorAction::LockEnd),
            RawEventKind::MonitorLockFast => self.monitor(record, MonitorAction::LockFast),
            RawEventKind::MonitorRelock => self.monitor(record, MonitorAction::Relock),
            RawEventKind::MonitorUnlockBegin => self.monitor(record, MonitorAction::UnlockBegin),
            RawEventKind::MonitorUnlockComplete => {
                self.monitor(record, MonitorAction::UnlockComplete)
            }
            RawEventKind::MonitorUnlockEnd => self.monitor(record, MonitorAction::UnlockEnd),
            RawEventKind::MonitorUnlockFast => self.monitor(record, MonitorAction::UnlockFast),
            RawEventKind::ObjectNew => self.object_new(record),
            RawEventKind::ScopeAlloc => self.scope_alloc(record),
            RawEventKind::ScopeBackingAlloc => self.scope_event(record, ScopeAction::BackingAlloc).map(drop),
            RawEventKind::ScopeBackingFree => self.scope_event(record, ScopeAction::BackingFree).map(drop),
            RawEventKind::ScopeEnter => self.scope_enter(record),
            RawEventKind::ScopeExit => self.scope_event(record, ScopeAction::Exit).map(drop),
            RawEventKind::ScopeFree => self.scope_free(record),
            RawEventKind::ScopePop => self.scope_pop(record),
            RawEventKind::ScopePush => self.scope_push(record),
            RawEventKind::SystemEnd => {
                self.emit(record, EventPayload::SystemEnd);
                Ok(())
            }
            RawEventKind::SystemStart => {
                self.emit(record, EventPayload::SystemStart);
                Ok(())
            }
            RawEventKind::ThreadCreate => self.thread_create(record),
            RawEventKind::ThreadEnd => self.thread_event(record, ThreadAction::End),
            RawEventKind::ThreadPriority => self.thread_priority(record),
            RawEventKind::ThreadSleep => self.thread_event(record, ThreadAction::Sleep),
            RawEventKind::ThreadStart => self.thread_event(record, ThreadAction::Start),
            RawEventKind::ThreadWake => self.thread_event(record, ThreadAction::Wake),
            RawEventKind::ThreadYield => self.thread_event(record, ThreadAction::Yield),
            RawEventKind::Unrecognized(tag) => {
                warn!(
                    "Skipping record with unrecognized kind {}: {}",
                    tag.as_deref().unwrap_or("<missing>"),
                    record
                );
                self.summary.skipped += 1;
                Ok(())
            }
        }
    }

    // ---- methods ----

    fn method_call(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let text = require(record, "signature")?;
        let signature = MethodSignature::parse(text).ok_or_else(|| BuildError::InvalidSignature {
            signature: text.to_string(),
            record: record.to_string(),
        })?;

        let owner = self.load_type(record, &signature.type_key)?;
        let method = self
            .resolver
            .resolve_method(owner, &signature.method.to_string());
        let caller = self.caller_value(record);
        let context = self.method_context(record, owner)?;
        let callee = self
            .store
            .create_method_contour(context, method, &record.thread, &*self.resolver)?;

        self.threads
            .entry(thread_key(&record.thread))
            .or_default()
            .call_stack
            .push(callee);
        self.summary.method_calls += 1;

        self.emit(
            record,
            EventPayload::MethodCall {
                caller,
                callee,
                method: signature.to_string(),
            },
        );
        Ok(())
    }

    fn method_exit(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let method = self
            .threads
            .get_mut(&thread_key(&record.thread))
            .and_then(|t| t.call_stack.pop())
            .ok_or_else(|| BuildError::StackUnderflow {
                thread: record.thread.clone(),
                record: record.to_string(),
            })?;

        let slot = self
            .store
            .get(method)
            .and_then(|c| c.member_index(RESULT_MEMBER))
            .map(|slot| (method, slot));
        let result = record.field("value").map(|raw| self.slot_value(slot, raw));
        if let (Some(value), Some((_, slot))) = (&result, slot) {
            self.store.replace_member(method, slot, value.clone());
        }

        self.emit(record, EventPayload::MethodExit { method, result });
        Ok(())
    }

    /// Top of the calling thread's stack, or the system pseudo-caller
    fn caller_value(&self, record: &RawEvent) -> Value {
        if record.field("caller") == Some(SYSTEM_TAG) {
            return Value::System;
        }
        self.threads
            .get(&thread_key(&record.thread))
            .and_then(|t| t.call_stack.last())
            .map_or(Value::System, |&top| Value::Contour(top))
    }

    /// Instance level of a live receiver declared by `owner`, else the
    /// owner's static contour
    fn method_context(&self, record: &RawEvent, owner: TypeId) -> Result<ContourId, BuildError> {
        let receiver = record
            .field("target")
            .and_then(parse_oid)
            .and_then(|raw| self.objects.get(&raw).copied());

        if let Some(concrete) = receiver {
            let level = self
                .store
                .instance_chain(concrete)
                .into_iter()
                .find(|&level| self.store.get(level).and_then(|c| c.type_id()) == Some(owner));
            if let Some(level) = level {
                return Ok(level);
            }
        }

        self.store
            .retrieve_static_contour(&self.type_name(owner))
            .map_err(|source| lookup_failed(record, source))
    }

    // ---- fields ----

    fn field_write(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let field = require(record, "field")?;
        let raw_value = record.field("value");

        let Some(raw_target) = record.field("target") else {
            return self.static_field_write(record, field, raw_value);
        };

        let bound = parse_oid(raw_target).and_then(|oid| self.objects.get(&oid).map(|&c| (oid, c)));
        let Some((target_oid, target)) = bound else {
            warn!("Field write to unknown object {}: {}", raw_target, record);
            let value = raw_value.map_or(Value::Null, |raw| self.resolve_value(raw));
            self.emit(
                record,
                EventPayload::FieldWrite {
                    target: Value::Literal(raw_target.to_string()),
                    member: field.to_string(),
                    value,
                    old: None,
                },
            );
            return Ok(());
        };

        let slot = self.locate_instance_field(record, target, field)?;
        let value = raw_value.map_or(Value::Null, |raw| self.slot_value(slot, raw));
        let old = slot.and_then(|(owner, index)| self.store.replace_member(owner, index, value.clone()));

        let value_oid = value.as_contour().and(raw_value).and_then(parse_oid);
        let target_region = self.regions.region_of(target_oid);
        let value_region = value_oid.and_then(|oid| self.regions.region_of(oid));

        let payload = match (target_region, value_region) {
            (Some(target_region), Some(value_region)) => {
                let state = self.threads.get(&thread_key(&record.thread));
                EventPayload::ScopeAssign {
                    target,
                    member: field.to_string(),
                    value,
                    old,
                    target_region: target_region.to_string(),
                    target_index: state.and_then(|s| s.region_index(target_region)),
                    value_region: value_region.to_string(),
                    value_index: state.and_then(|s| s.region_index(value_region)),
                }
            }
            _ => EventPayload::FieldWrite {
                target: Value::Contour(target),
                member: field.to_string(),
                value,
                old,
            },
        };

        self.emit(record, payload);
        Ok(())
    }

    fn static_field_write(
        &mut self,
        record: &RawEvent,
        field: &str,
        raw_value: Option<&str>,
    ) -> Result<(), BuildError> {
        let type_key = require(record, "type")?;
        let type_id = self.load_type(record, type_key)?;
        let contour = self
            .store
            .retrieve_static_contour(&self.type_name(type_id))
            .map_err(|source| lookup_failed(record, source))?;

        let (owner, slot) = self.locate(contour, field, true)?;
        let value = raw_value.map_or(Value::Null, |raw| self.slot_value(Some((owner, slot)), raw));
        let old = self.store.replace_member(owner, slot, value.clone());
        self.emit(
            record,
            EventPayload::FieldWrite {
                target: Value::Contour(contour),
                member: field.to_string(),
                value,
                old,
            },
        );
        Ok(())
    }

    /// Slot for `field` on the object whose concrete level is reachable from
    /// `target`; `None` for an out-of-bounds array cell
    fn locate_instance_field(
        &mut self,
        record: &RawEvent,
        target: ContourId,
        field: &str,
    ) -> Result<Option<(ContourId, usize)>, BuildError> {
        let concrete = self.store.concrete_contour(target);

        if self.store.get(concrete).is_some_and(|c| c.is_array()) {
            let index = field
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .parse::<usize>()
                .map_err(|_| invalid(record, "field", field))?;

            let slot = self
                .store
                .get(concrete)
                .and_then(|c| c.member_index(&format!("[{index}]")));
            if slot.is_none() {
                warn!("Array index {} out of bounds: {}", index, record);
            }
            return Ok(slot.map(|slot| (concrete, slot)));
        }

        // Shadowed fields resolve from the declaring level when the record
        // names it
        let start = record
            .field("type")
            .and_then(|name| self.resolver.lookup_type(name))
            .and_then(|declaring| {
                self.store
                    .instance_chain(concrete)
                    .into_iter()
                    .find(|&level| self.store.get(level).and_then(|c| c.type_id()) == Some(declaring))
            })
            .unwrap_or(concrete);

        self.locate(start, field, false).map(Some)
    }

    /// Member named `field` reachable from `start`, synthesizing the slot on
    /// `start` if no level declares it
    fn locate(
        &mut self,
        start: ContourId,
        field: &str,
        is_static: bool,
    ) -> Result<(ContourId, usize), BuildError> {
        if let Some(found) = self.store.find_member(start, field) {
            return Ok(found);
        }

        let type_id = self
            .store
            .get(start)
            .and_then(|c| c.type_id())
            .ok_or(ContourError::UnknownContour(start))?;
        let data = self.resolver.resolve_field(type_id, field, is_static);
        let member = self
            .resolver
            .data_node(data)
            .map(ContourMember::field)
            .ok_or_else(|| ContourError::UnknownType(self.type_name(type_id)))?;
        Ok((start, self.store.add_member(start, member)?))
    }

    fn assign(
        &mut self,
        start: ContourId,
        field: &str,
        value: Value,
        is_static: bool,
    ) -> Result<Option<Value>, BuildError> {
        let (owner, slot) = self.locate(start, field, is_static)?;
        Ok(self.store.replace_member(owner, slot, value))
    }

    /// Declared type of a member slot
    fn slot_type(&self, owner: ContourId, slot: usize) -> Option<String> {
        let contour = self.store.get(owner)?;
        match contour.member(slot)?.schema() {
            MemberSchema::Field(data) | MemberSchema::Variable(data) => {
                self.resolver.data_node(data).map(|d| d.type_name.clone())
            }
            MemberSchema::ArrayCell { element, .. } => Some(self.type_name(element)),
            MemberSchema::Result => contour
                .method_id()
                .and_then(|m| self.resolver.method_node(m))
                .map(|m| m.return_type.clone()),
            MemberSchema::Rpdl => None,
        }
    }

    fn is_primitive(&self, type_name: &str) -> bool {
        PRIMITIVE_TYPES.contains(&type_name)
            || self
                .resolver
                .lookup_type(type_name)
                .and_then(|t| self.resolver.type_node(t))
                .is_some_and(|node| node.kind == TypeKind::Primitive)
    }

    /// Value text as stored in `slot`: primitive slots keep the literal even
    /// when it matches a live oid
    fn slot_value(&self, slot: Option<(ContourId, usize)>, raw: &str) -> Value {
        let primitive = slot
            .and_then(|(owner, index)| self.slot_type(owner, index))
            .is_some_and(|type_name| self.is_primitive(&type_name));
        if primitive && raw != "null" {
            Value::Literal(raw.to_string())
        } else {
            self.resolve_value(raw)
        }
    }

    /// Assign and emit the matching field-write event
    fn write_field(
        &mut self,
        record: &RawEvent,
        contour: ContourId,
        field: &str,
        value: Value,
        is_static: bool,
    ) -> Result<(), BuildError> {
        let old = self.assign(contour, field, value.clone(), is_static)?;
        self.emit(
            record,
            EventPayload::FieldWrite {
                target: Value::Contour(contour),
                member: field.to_string(),
                value,
                old,
            },
        );
        Ok(())
    }

    // ---- objects ----

    fn object_new(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let type_key = require(record, "type")?;
        let raw_object = require(record, "object")?;
        let raw_oid = parse_oid(raw_object).ok_or_else(|| invalid(record, "object", raw_object))?;
        let elements = record
            .field("elements")
            .map(|raw| raw.trim().parse::<usize>().map_err(|_| invalid(record, "elements", raw)))
            .transpose()?;

        let type_id = self.load_type(record, type_key)?;
        let type_name = self.type_name(type_id);
        let oid = self.unique_oid(&type_name, raw_oid);
        if oid != raw_oid {
            debug!("Remapped colliding oid {:#x} -> {:#x} for {}", raw_oid, oid, type_name);
        }

        let is_array = self
            .resolver
            .type_node(type_id)
            .is_some_and(|node| node.kind == TypeKind::Array);
        if is_array && elements.is_none() {
            warn!("Array allocation without element count, creating empty array: {}", record);
        }

        let contour = match elements {
            Some(length) => self
                .store
                .create_array_contour(type_id, oid, length, &*self.resolver)?,
            None => self.store.create_instance_contour(type_id, oid, &*self.resolver)?,
        };

        let region = self
            .threads
            .get(&thread_key(&record.thread))
            .and_then(|t| t.current_region.clone());

        self.emit(
            record,
            EventPayload::NewObject {
                contour,
                type_name,
                oid,
                region: region.clone(),
            },
        );

        self.objects.insert(raw_oid, contour);
        if let Some(region) = region {
            self.regions.record(raw_oid, &region, contour);
        }
        self.summary.objects += 1;
        Ok(())
    }

    /// First oid, starting from `raw`, with no instance contour of `type_name`
    fn unique_oid(&self, type_name: &str, raw: Oid) -> Oid {
        let mut candidate = raw;
        while self.store.lookup_instance_contour(type_name, candidate).is_some() {
            candidate = remap_oid(candidate);
        }
        candidate
    }

    /// `null`, a live object, or an opaque literal
    fn resolve_value(&self, raw: &str) -> Value {
        if raw == "null" {
            return Value::Null;
        }
        parse_oid(raw)
            .and_then(|oid| self.objects.get(&oid))
            .map_or_else(|| Value::Literal(raw.to_string()), |&c| Value::Contour(c))
    }

    // ---- regions ----

    fn scope_event<'r>(&mut self, record: &'r RawEvent, action: ScopeAction) -> Result<&'r str, BuildError> {
        let scope = require(record, "scope")?;
        let size = record.field("size").and_then(|s| s.trim().parse::<u64>().ok());
        self.emit(
            record,
            EventPayload::Scope {
                action,
                scope: scope.to_string(),
                size,
            },
        );
        Ok(scope)
    }

    fn scope_alloc(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let scope = self.scope_event(record, ScopeAction::Alloc)?;
        self.regions.allocate(scope);
        Ok(())
    }

    fn scope_enter(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let scope = self.scope_event(record, ScopeAction::Enter)?;
        self.threads.entry(thread_key(&record.thread)).or_default().current_region = Some(scope.to_string());
        Ok(())
    }

    fn scope_push(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let scope = require(record, "scope")?;
        self.threads
            .entry(thread_key(&record.thread))
            .or_default()
            .region_stack
            .get_or_insert_with(Vec::new)
            .push(scope.to_string());
        self.scope_event(record, ScopeAction::Push).map(drop)
    }

    fn scope_pop(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let popped = self
            .threads
            .get_mut(&thread_key(&record.thread))
            .and_then(|t| t.region_stack.as_mut())
            .and_then(Vec::pop);
        if popped.is_none() {
            warn!("Region pop with empty region stack: {}", record);
        }

        // Pop records may omit the region name; report the one removed
        let scope = record
            .field("scope")
            .map(str::to_string)
            .or(popped)
            .unwrap_or_default();
        let size = record.field("size").and_then(|s| s.trim().parse::<u64>().ok());
        self.emit(
            record,
            EventPayload::Scope {
                action: ScopeAction::Pop,
                scope,
                size,
            },
        );
        Ok(())
    }

    /// Bulk free: every object allocated in the region is destroyed
    fn scope_free(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let scope = self.scope_event(record, ScopeAction::Free)?;
        let freed = self.regions.free(scope);

        for &contour in &freed {
            self.emit(
                record,
                EventPayload::Destroy {
                    contour,
                    region: scope.to_string(),
                },
            );
        }

        self.objects.retain(|_, c| !freed.contains(c));
        self.summary.destroyed += freed.len() as u64;
        debug!("Freed region {} ({} objects)", scope, freed.len());
        Ok(())
    }

    // ---- threads ----

    /// Thread object plus a synthetic constructor sequence the raw format
    /// does not record
    fn thread_create(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let raw_tid = require(record, "newthread")?;
        let tid = parse_oid(raw_tid).ok_or_else(|| invalid(record, "newthread", raw_tid))?;

        if self.store.lookup_instance_contour(THREAD_TYPE, tid).is_some() {
            warn!("Ignoring duplicate thread creation: {}", record);
            self.summary.duplicate_threads += 1;
            return Ok(());
        }

        let type_id = self.load_type(record, THREAD_TYPE)?;
        let thread = self
            .store
            .create_instance_contour(type_id, tid, &*self.resolver)?;
        self.threads
            .entry(tid.to_string())
            .or_default()
            .call_stack
            .clear();
        self.summary.threads += 1;

        self.emit(
            record,
            EventPayload::ThreadNew {
                contour: thread,
                thread_id: raw_tid.to_string(),
            },
        );

        let constructor = self.resolver.resolve_method(type_id, CONSTRUCTOR_KEY);
        let caller = self.caller_value(record);
        let method = self
            .store
            .create_method_contour(thread, constructor, &record.thread, &*self.resolver)?;

        self.emit(
            record,
            EventPayload::MethodCall {
                caller,
                callee: method,
                method: format!("{THREAD_TYPE};.{CONSTRUCTOR_KEY}"),
            },
        );
        self.emit(record, EventPayload::MethodEntered);
        self.write_field(record, thread, THREAD_ID_FIELD, Value::Literal(raw_tid.to_string()), false)?;
        self.emit(record, EventPayload::MethodExit { method, result: None });
        Ok(())
    }

    fn thread_priority(&mut self, record: &RawEvent) -> Result<(), BuildError> {
        let raw_target = record
            .field("target")
            .or_else(|| record.field("newthread"))
            .unwrap_or(record.thread.as_str());
        let tid = parse_oid(raw_target).ok_or_else(|| invalid(record, "target", raw_target))?;
        let thread = self
            .store
            .retrieve_instance_contour(THREAD_TYPE, tid)
            .map_err(|source| lookup_failed(record, source))?;
        let thread = self.store.concrete_contour(thread);

        let priority = require(record, "priority")?;
        let scheduler = record.field("scheduler");

        self.emit(
            record,
            EventPayload::ThreadPriority {
                contour: thread,
                scheduler: scheduler.map(str::to_string),
                priority: priority.to_string(),
            },
        );

        let scheduler_value = scheduler.map_or(Value::Null, |s| Value::Literal(s.to_string()));
        self.write_field(record, thread, THREAD_SCHEDULER_FIELD, scheduler_value, false)?;
        self.write_field(record, thread, THREAD_PRIORITY_FIELD, Value::Literal(priority.to_string()), false)
    }

    fn thread_event(&mut self, record: &RawEvent, action: ThreadAction) -> Result<(), BuildError> {
        let waketime = record
            .field("waketime")
            .and_then(|w| w.trim().parse::<i64>().ok());
        self.emit(record, EventPayload::Thread { action, waketime });
        Ok(())
    }

    fn monitor(&mut self, record: &RawEvent, action: MonitorAction) -> Result<(), BuildError> {
        let monitor = require(record, "monitor")?;
        self.emit(
            record,
            EventPayload::Monitor {
                action,
                monitor: monitor.to_string(),
            },
        );
        Ok(())
    }

    // ---- shared helpers ----

    /// Resolve a type key and materialize its static chain, emitting one
    /// type-load event per newly created level
    fn load_type(&mut self, record: &RawEvent, key: &str) -> Result<TypeId, BuildError> {
        let type_id = self.resolver.resolve_type(key);
        let is_reference = self
            .resolver
            .type_node(type_id)
            .is_some_and(|node| node.kind.is_reference());
        if !is_reference {
            return Ok(type_id);
        }

        let created = self.store.ensure_static_chain(type_id, &*self.resolver)?;
        for contour in created {
            let type_name = self
                .store
                .get(contour)
                .and_then(|c| c.type_id())
                .map(|t| self.type_name(t))
                .unwrap_or_default();
            self.emit(record, EventPayload::TypeLoad { contour, type_name });
        }

        Ok(type_id)
    }

    fn type_name(&self, type_id: TypeId) -> String {
        self.resolver
            .type_node(type_id)
            .map(|node| node.name.clone())
            .unwrap_or_default()
    }

    fn thread_ref(&self, record: &RawEvent) -> ThreadRef {
        if record.is_system_thread() {
            return ThreadRef::System;
        }
        let contour = parse_oid(&record.thread)
            .and_then(|tid| self.store.lookup_instance_contour(THREAD_TYPE, tid));
        ThreadRef::Thread {
            id: record.thread.clone(),
            contour,
        }
    }

    fn emit(&mut self, record: &RawEvent, payload: EventPayload) {
        let thread = self.thread_ref(record);
        self.batcher
            .push(record.timestamp, thread, record.line, payload, &mut *self.sink);
    }
}

/// Thread map key: numeric ids in any radix share one canonical spelling
fn thread_key(raw: &str) -> String {
    parse_oid(raw).map_or_else(|| raw.to_string(), |tid| tid.to_string())
}

fn require<'r>(record: &'r RawEvent, field: &'static str) -> Result<&'r str, BuildError> {
    record.field(field).ok_or_else(|| BuildError::MissingField {
        field,
        record: record.to_string(),
    })
}

fn invalid(record: &RawEvent, field: &'static str, value: &str) -> BuildError {
    BuildError::InvalidValue {
        field,
        value: value.to_string(),
        record: record.to_string(),
    }
}

fn lookup_failed(record: &RawEvent, source: ContourError) -> BuildError {
    BuildError::Lookup {
        source,
        record: record.to_string(),
    }
}
