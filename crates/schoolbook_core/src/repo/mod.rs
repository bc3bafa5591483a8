//! Persistence layer: key/value storage and the school document store.
//!
//! # Responsibility
//! - Keep SQLite and JSON encoding details behind repository contracts.
//! - Upgrade stored documents before handing typed records to services.
//!
//! # Invariants
//! - A save writes the whole document in one statement batch or not at all.
//! - Loads repair structural damage instead of failing on it.

pub mod kv_repo;
pub mod schema;
pub mod school_store;
