//! Configuration and constants for the builder and CLI.

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Number of model events delivered to the sink per batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Thread/caller tag used by the tracer for the system pseudo-thread
pub const SYSTEM_TAG: &str = "SYSTEM";

// Well-known types the builder synthesizes contours for on its own
pub const ROOT_TYPE: &str = "java.lang.Object";
pub const THREAD_TYPE: &str = "java.lang.Thread";

// Thread fields written by synthetic construction and priority changes
pub const THREAD_ID_FIELD: &str = "tid";
pub const THREAD_SCHEDULER_FIELD: &str = "scheduler";
pub const THREAD_PRIORITY_FIELD: &str = "priority";

/// Method key used for the synthetic thread constructor
pub const CONSTRUCTOR_KEY: &str = "<init>()void";

// Reserved method contour members, always the last two slots in this order
pub const RESULT_MEMBER: &str = "$result";
pub const RPDL_MEMBER: &str = "$rpdl";

// Object id collision remap: oid = oid * 7 + oid % 19
pub const OID_REMAP_MULTIPLIER: u64 = 7;
pub const OID_REMAP_MODULUS: u64 = 19;

/// Primitive type names recognised by the resolver
pub const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];
