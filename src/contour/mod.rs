//! Contour model: static, instance and method environments.
//!
//! This module handles:
//! - Contour identity, ordinals and parent/child links
//! - Member slots and model values
//! - The store that creates and indexes contours

pub mod member;
pub mod record;
pub mod store;

// Re-export main types
pub use member::{ContourMember, MemberSchema, Value};
pub use record::{Contour, ContourId, ContourKind, Oid};
pub use store::ContourStore;
