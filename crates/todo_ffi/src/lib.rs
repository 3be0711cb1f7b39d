//! Flutter-facing bindings for `todo_core`.

pub mod api;
