//! Model-mutation events delivered to the execution model sink.

use crate::contour::{ContourId, Oid, Value};
use serde::{Deserialize, Serialize};

/// Thread an event happened on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThreadRef {
    System,
    Thread {
        id: String,
        /// Thread object contour, once the thread has been created
        contour: Option<ContourId>,
    },
}

/// One emitted model event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvent {
    /// Position in the emitted sequence, starting at 1
    pub number: u64,
    pub timestamp: i64,
    pub thread: ThreadRef,
    /// Source line; `None` means unavailable
    pub line: Option<u32>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeAction {
    Alloc,
    Enter,
    Exit,
    BackingAlloc,
    BackingFree,
    Push,
    Pop,
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadAction {
    Start,
    End,
    Sleep,
    Wake,
    Yield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorAction {
    LockBegin,
    LockEnd,
    LockFast,
    Relock,
    UnlockBegin,
    UnlockComplete,
    UnlockEnd,
    UnlockFast,
}

/// Kind-specific event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    SystemStart,
    SystemEnd,
    TypeLoad {
        contour: ContourId,
        type_name: String,
    },
    MethodCall {
        caller: Value,
        callee: ContourId,
        method: String,
    },
    MethodEntered,
    MethodExit {
        method: ContourId,
        result: Option<Value>,
    },
    FieldWrite {
        target: Value,
        member: String,
        value: Value,
        old: Option<Value>,
    },
    /// Field write whose target and value both live in regions; indices are
    /// positions in the writer's region stack, `None` when absent or when
    /// the thread has no stack
    ScopeAssign {
        target: ContourId,
        member: String,
        value: Value,
        old: Option<Value>,
        target_region: String,
        target_index: Option<usize>,
        value_region: String,
        value_index: Option<usize>,
    },
    NewObject {
        contour: ContourId,
        type_name: String,
        oid: Oid,
        region: Option<String>,
    },
    Destroy {
        contour: ContourId,
        region: String,
    },
    Scope {
        action: ScopeAction,
        scope: String,
        size: Option<u64>,
    },
    ThreadNew {
        contour: ContourId,
        thread_id: String,
    },
    Thread {
        action: ThreadAction,
        waketime: Option<i64>,
    },
    ThreadPriority {
        contour: ContourId,
        scheduler: Option<String>,
        priority: String,
    },
    Monitor {
        action: MonitorAction,
        monitor: String,
    },
}

impl EventPayload {
    /// Snake-case kind tag, as serialized
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventPayload::SystemStart => "system_start",
            EventPayload::SystemEnd => "system_end",
            EventPayload::TypeLoad { .. } => "type_load",
            EventPayload::MethodCall { .. } => "method_call",
            EventPayload::MethodEntered => "method_entered",
            EventPayload::MethodExit { .. } => "method_exit",
            EventPayload::FieldWrite { .. } => "field_write",
            EventPayload::ScopeAssign { .. } => "scope_assign",
            EventPayload::NewObject { .. } => "new_object",
            EventPayload::Destroy { .. } => "destroy",
            EventPayload::Scope { .. } => "scope",
            EventPayload::ThreadNew { .. } => "thread_new",
            EventPayload::Thread { .. } => "thread",
            EventPayload::ThreadPriority { .. } => "thread_priority",
            EventPayload::Monitor { .. } => "monitor",
        }
    }
}
