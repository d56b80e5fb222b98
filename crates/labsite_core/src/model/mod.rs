//! Domain model for the lab site's orderable collections.
//!
//! # Responsibility
//! - Define the record shapes stored per collection.
//! - Define the `Orderable` capability and the pure ordering planner.
//!
//! # Invariants
//! - Every record is identified by a store-assigned integer id.
//! - Deletion is represented by soft-delete flags, not hard delete.

pub mod job;
pub mod news;
pub mod ordering;
pub mod page;
pub mod paper;
pub mod team_member;
pub mod validation;
