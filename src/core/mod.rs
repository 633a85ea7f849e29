//! Core domain models for plan import.
//!
//! Task records parsed from the plan document and the dependency edge
//! table that links them.

pub mod deps;
pub mod task;

pub use deps::{DependencyEdge, DependencyTable, TableDrift};
pub use task::{TaskId, TaskRecord};
