//! Integration test suite for beadplan.
//!
//! These tests drive the parser, the task creator and the dependency
//! applier together against a recording tracker, so no `bd` binary is
//! needed.
//!
//! # Test Categories
//!
//! - `parser_boundaries`: field boundaries on realistic plan documents
//! - `import_e2e`: parse, create and link a whole plan
//! - `dependency_apply`: edge ordering, unmapped edges, staged runs


mod dependency_apply;
mod import_e2e;
mod parser_boundaries;
