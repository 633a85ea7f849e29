//! Import pipeline: create tasks, then wire their dependencies.
//!
//! Both phases are strictly sequential and share one [`IdMap`] owned by the
//! caller. Creation writes it; application only reads it.
//!
//! [`IdMap`]: crate::IdMap

pub mod applier;
pub mod creator;

pub use applier::{ApplyReport, DependencyApplier, EdgeOutcome};
pub use creator::{CreationOutcome, CreationReport, TaskCreator};

use crate::core::{DependencyTable, TaskRecord};
use crate::mapping::IdMap;

/// Where the dependency edges come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeSource {
    /// The authored table when it has edges, otherwise the document.
    #[default]
    Auto,
    /// Only the authored `[dependencies]` table.
    Table,
    /// Only the records' `Dependencies:` text.
    Document,
}

impl EdgeSource {
    /// Pick the edge table for a run.
    pub fn select(self, authored: &DependencyTable, records: &[TaskRecord]) -> DependencyTable {
        self.select_known(authored, records, &IdMap::new())
    }

    /// Like [`EdgeSource::select`]; ids already in `map` (seeds, earlier
    /// runs) also count as known when deriving edges from the document.
    pub fn select_known(
        self,
        authored: &DependencyTable,
        records: &[TaskRecord],
        map: &IdMap,
    ) -> DependencyTable {
        match self {
            EdgeSource::Table => authored.clone(),
            EdgeSource::Auto if !authored.is_empty() => authored.clone(),
            EdgeSource::Document | EdgeSource::Auto => {
                DependencyTable::from_records_known(records, map.iter().map(|(id, _)| id))
            }
        }
    }
}

/// Outcome of a create-then-link run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub creation: CreationReport,
    pub dependencies: ApplyReport,
}

impl RunReport {
    /// Failed creations plus failed or skipped edges.
    pub fn failures(&self) -> usize {
        self.creation.failed() + self.dependencies.failed()
    }
}
