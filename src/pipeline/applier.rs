//! Dependency application phase.
//!
//! Walks the edge table in a fixed order (dependent id ascending, then
//! prerequisites as declared) and asks the tracker for one relationship per
//! edge whose two ends are both mapped. Unmapped edges are skipped without a
//! tracker call. Nothing is deduplicated: applying the same table twice asks
//! the tracker twice.

use crate::core::{DependencyEdge, DependencyTable, TaskId};
use crate::mapping::IdMap;
use crate::tracker::Tracker;
use crate::{bplog, bplog_debug, bplog_warn};

/// What happened to one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeOutcome {
    Applied,
    /// One or both endpoints had no external id. Never sent to the tracker.
    Unmapped(Vec<TaskId>),
    /// The tracker reported an error.
    Failed(String),
}

impl EdgeOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, EdgeOutcome::Applied)
    }
}

/// Per-edge outcomes, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub outcomes: Vec<(DependencyEdge, EdgeOutcome)>,
}

impl ApplyReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn applied(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_applied()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.applied()
    }
}

/// Applies a dependency table to tracker tasks through an [`IdMap`].
pub struct DependencyApplier;

impl DependencyApplier {
    /// Apply one edge.
    pub fn apply_edge(
        edge: &DependencyEdge,
        tracker: &mut dyn Tracker,
        map: &IdMap,
    ) -> EdgeOutcome {
        let (dependent, prerequisite) = match (map.get(&edge.dependent), map.get(&edge.prerequisite))
        {
            (Some(d), Some(p)) => (d, p),
            (d, p) => {
                let mut missing = Vec::new();
                if d.is_none() {
                    missing.push(edge.dependent.clone());
                }
                if p.is_none() {
                    missing.push(edge.prerequisite.clone());
                }
                bplog_warn!("skipping {}: no external id for {:?}", edge, missing);
                return EdgeOutcome::Unmapped(missing);
            }
        };

        bplog_debug!("applying {} ({} -> {})", edge, dependent, prerequisite);
        match tracker.add_dependency(dependent, prerequisite) {
            Ok(()) => EdgeOutcome::Applied,
            Err(e) => {
                bplog_warn!("failed to apply {}: {}", edge, e);
                EdgeOutcome::Failed(e.to_string())
            }
        }
    }

    /// Apply every edge of `table`.
    pub fn apply(table: &DependencyTable, tracker: &mut dyn Tracker, map: &IdMap) -> ApplyReport {
        Self::apply_with(table, tracker, map, |_, _| {})
    }

    /// Like [`DependencyApplier::apply`], calling `on_outcome` after each edge.
    pub fn apply_with<F>(
        table: &DependencyTable,
        tracker: &mut dyn Tracker,
        map: &IdMap,
        mut on_outcome: F,
    ) -> ApplyReport
    where
        F: FnMut(&DependencyEdge, &EdgeOutcome),
    {
        let mut report = ApplyReport::default();
        for edge in table.edges() {
            let outcome = Self::apply_edge(&edge, tracker, map);
            on_outcome(&edge, &outcome);
            report.outcomes.push((edge, outcome));
        }
        bplog!(
            "dependencies finished: {}/{} applied",
            report.applied(),
            report.attempted()
        );
        report
    }
}
