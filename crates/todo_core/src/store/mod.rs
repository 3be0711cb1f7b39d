//! Task collection persistence.
//!
//! # Responsibility
//! - Serialize the whole task collection to one JSON blob under one key.
//! - Degrade read failures to seed data; surface write failures as values.
//! - Offer a revision token so writers can refuse to clobber newer data.
//!
//! # Invariants
//! - Every write replaces the entire blob; there are no partial writes.
//! - The persisted layout is a bare JSON array of task objects.

pub mod revision;
pub mod task_store;
