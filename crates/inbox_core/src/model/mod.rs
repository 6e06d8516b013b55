//! Domain model for captured inbox items.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one item shape for task, knowledge and archived projections.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Deletion is represented by a tombstone status, not hard delete.

pub mod item;
pub mod tag_set;
