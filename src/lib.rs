pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod mapping;
pub mod parser;
pub mod pipeline;
pub mod tracker;

pub use crate::core::{DependencyEdge, DependencyTable, TaskId, TaskRecord};
pub use error::{Error, Result};
pub use mapping::{ExternalId, IdMap};
pub use tracker::{BdTracker, CreateRequest, DryRunTracker, Tracker};
