//! Typed record graph for school administration data.
//!
//! # Responsibility
//! - Define the canonical records persisted in the school document.
//! - Keep the serialized shape compatible with the legacy camelCase layout.
//!
//! # Invariants
//! - `Student::code` is a unique 6-digit numeric string.
//! - Every student references a class by stable `ClassId`; its `class_name`
//!   is a cached copy of that class's display name.
//! - Records are never hard-deleted.

pub mod class;
pub mod fee;
pub mod school;
pub mod session;
pub mod student;
pub mod teacher;

use uuid::Uuid;

/// Generates a prefixed record id such as `C-3f2a...`.
///
/// Prefixes keep ids readable in exported documents (`C` class, `T` teacher,
/// `F` fee record).
pub(crate) fn new_prefixed_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
