//! Domain model for the to-do list.
//!
//! # Responsibility
//! - Define the canonical `Task` record persisted inside the collection blob.
//! - Provide collection-level helpers shared by store and controllers.
//!
//! # Invariants
//! - Every task is identified by an integer `TaskId`, unique per collection.
//! - Storage imposes no ordering; display order is descending id.

pub mod task;
