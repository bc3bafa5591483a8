//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate load-mutate-save cycles into use-case level APIs.
//! - Enforce role gates before any record is touched.
//! - Keep CLI/UI layers decoupled from storage details.
//!
//! # Invariants
//! - Every successful mutation performs exactly one persist call.
//! - A failed mutation persists nothing.

pub mod auth_service;
mod guard;
pub mod school_service;
