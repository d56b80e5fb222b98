//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Every write that affects positions goes through `order_repo`.
//! - Repository APIs return semantic errors (`NotFound`, `InvalidOrder`) in
//!   addition to DB transport errors.

pub mod collection_repo;
pub mod order_repo;
mod records;
