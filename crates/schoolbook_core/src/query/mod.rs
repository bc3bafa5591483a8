//! Read-side lookups used by list screens and forms.
//!
//! # Responsibility
//! - Filter students and fee records the way list screens search them.
//! - Build form option lists, profile details and the marks entry sheet.
//!
//! # Invariants
//! - Queries never mutate the record graph.
//! - Result ordering follows storage order unless stated otherwise.

pub mod profile;
pub mod roster;
