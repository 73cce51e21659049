//! Raw trace records as written by the tracer.

use crate::utils::config::SYSTEM_TAG;
use std::collections::BTreeMap;
use std::fmt;

/// Kind tag of a raw trace record
///
/// The vocabulary is closed; anything else is carried as `Unrecognized`
/// so the builder can skip it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    FieldWrite,
    MethodCall,
    MethodEntered,
    MethodExit,
    MonitorLockBegin,
    MonitorLockEnd,
    MonitorLockFast,
    MonitorRelock,
    MonitorUnlockBegin,
    MonitorUnlockComplete,
    MonitorUnlockEnd,
    MonitorUnlockFast,
    ObjectNew,
    ScopeAlloc,
    ScopeBackingAlloc,
    ScopeBackingFree,
    ScopeEnter,
    ScopeExit,
    ScopeFree,
    ScopePop,
    ScopePush,
    SystemEnd,
    SystemStart,
    ThreadCreate,
    ThreadEnd,
    ThreadPriority,
    ThreadSleep,
    ThreadStart,
    ThreadWake,
    ThreadYield,
    /// Absent (`None`) or unmapped kind tag
    Unrecognized(Option<String>),
}

impl RawEventKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "FIELD_WRITE" => Self::FieldWrite,
            "METHOD_CALL" => Self::MethodCall,
            "METHOD_ENTERED" => Self::MethodEntered,
            "METHOD_EXIT" => Self::MethodExit,
            "MONITOR_LOCK_BEGIN" => Self::MonitorLockBegin,
            "MONITOR_LOCK_END" => Self::MonitorLockEnd,
            "MONITOR_LOCK_FAST" => Self::MonitorLockFast,
            "MONITOR_RELOCK" => Self::MonitorRelock,
            "MONITOR_UNLOCK_BEGIN" => Self::MonitorUnlockBegin,
            "MONITOR_UNLOCK_COMPLETE" => Self::MonitorUnlockComplete,
            "MONITOR_UNLOCK_END" => Self::MonitorUnlockEnd,
            "MONITOR_UNLOCK_FAST" => Self::MonitorUnlockFast,
            "OBJECT_NEW" => Self::ObjectNew,
            "SCOPE_ALLOC" => Self::ScopeAlloc,
            "SCOPE_BACKING_ALLOC" => Self::ScopeBackingAlloc,
            "SCOPE_BACKING_FREE" => Self::ScopeBackingFree,
            "SCOPE_ENTER" => Self::ScopeEnter,
            "SCOPE_EXIT" => Self::ScopeExit,
            "SCOPE_FREE" => Self::ScopeFree,
            "SCOPE_POP" => Self::ScopePop,
            "SCOPE_PUSH" => Self::ScopePush,
            "SYSTEM_END" => Self::SystemEnd,
            "SYSTEM_START" => Self::SystemStart,
            "THREAD_CREATE" => Self::ThreadCreate,
            "THREAD_END" => Self::ThreadEnd,
            "THREAD_PRIORITY" => Self::ThreadPriority,
            "THREAD_SLEEP" => Self::ThreadSleep,
            "THREAD_START" => Self::ThreadStart,
            "THREAD_WAKE" => Self::ThreadWake,
            "THREAD_YIELD" => Self::ThreadYield,
            other => Self::Unrecognized(Some(other.to_string())),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            Self::FieldWrite => "FIELD_WRITE",
            Self::MethodCall => "METHOD_CALL",
            Self::MethodEntered => "METHOD_ENTERED",
            Self::MethodExit => "METHOD_EXIT",
            Self::MonitorLockBegin => "MONITOR_LOCK_BEGIN",
            Self::MonitorLockEnd => "MONITOR_LOCK_END",
            Self::MonitorLockFast => "MONITOR_LOCK_FAST",
            Self::MonitorRelock => "MONITOR_RELOCK",
            Self::MonitorUnlockBegin => "MONITOR_UNLOCK_BEGIN",
            Self::MonitorUnlockComplete => "MONITOR_UNLOCK_COMPLETE",
            Self::MonitorUnlockEnd => "MONITOR_UNLOCK_END",
            Self::MonitorUnlockFast => "MONITOR_UNLOCK_FAST",
            Self::ObjectNew => "OBJECT_NEW",
            Self::ScopeAlloc => "SCOPE_ALLOC",
            Self::ScopeBackingAlloc => "SCOPE_BACKING_ALLOC",
            Self::ScopeBackingFree => "SCOPE_BACKING_FREE",
            Self::ScopeEnter => "SCOPE_ENTER",
            Self::ScopeExit => "SCOPE_EXIT",
            Self::ScopeFree => "SCOPE_FREE",
            Self::ScopePop => "SCOPE_POP",
            Self::ScopePush => "SCOPE_PUSH",
            Self::SystemEnd => "SYSTEM_END",
            Self::SystemStart => "SYSTEM_START",
            Self::ThreadCreate => "THREAD_CREATE",
            Self::ThreadEnd => "THREAD_END",
            Self::ThreadPriority => "THREAD_PRIORITY",
            Self::ThreadSleep => "THREAD_SLEEP",
            Self::ThreadStart => "THREAD_START",
            Self::ThreadWake => "THREAD_WAKE",
            Self::ThreadYield => "THREAD_YIELD",
            Self::Unrecognized(Some(tag)) => tag.as_str(),
            Self::Unrecognized(None) => "<missing>",
        }
    }
}

impl fmt::Display for RawEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One raw trace record
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub timestamp: i64,
    /// Thread id, or `SYSTEM`
    pub thread: String,
    /// Source line, if the tracer recorded one
    pub line: Option<u32>,
    /// Kind-specific fields, all kept as text
    pub fields: BTreeMap<String, String>,
}

impl RawEvent {
    pub fn new(kind: RawEventKind, timestamp: i64, thread: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            thread: thread.into(),
            line: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add a kind-specific field (builder style)
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn is_system_thread(&self) -> bool {
        self.thread == SYSTEM_TAG
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} t={} thread={}", self.kind, self.timestamp, self.thread)?;
        if let Some(line) = self.line {
            write!(f, " line={line}")?;
        }
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

/// Parse an object or thread identifier from hex (`0x` prefix) or decimal
pub fn parse_oid(value: &str) -> Option<u64> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => value.parse::<u64>().ok(),
    }
}
