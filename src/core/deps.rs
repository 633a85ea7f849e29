//! Dependency edge table.
//!
//! Edges are keyed by the dependent task; each dependent lists its
//! prerequisites in declared order. The table is either authored by hand
//! (the `[dependencies]` config section) or derived from the dependency
//! text of parsed records. No cycle check is made in either case.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::bplog_debug;
use crate::core::task::{TaskId, TaskRecord};

/// A directed edge: `dependent` is blocked until `prerequisite` is done.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub dependent: TaskId,
    pub prerequisite: TaskId,
}

impl DependencyEdge {
    pub fn new(dependent: TaskId, prerequisite: TaskId) -> Self {
        Self {
            dependent,
            prerequisite,
        }
    }
}

impl std::fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.dependent, self.prerequisite)
    }
}

/// Static table of dependency edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyTable {
    edges: BTreeMap<TaskId, Vec<TaskId>>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prerequisite to `dependent`'s list.
    pub fn add(&mut self, dependent: TaskId, prerequisite: TaskId) {
        self.edges.entry(dependent).or_default().push(prerequisite);
    }

    /// Build the table from each record's dependency text, linking only
    /// ids that some record declares.
    pub fn from_records(records: &[TaskRecord]) -> Self {
        Self::from_records_known(records, std::iter::empty::<&TaskId>())
    }

    /// Like [`DependencyTable::from_records`], also accepting `extra` ids
    /// (seeded or already mapped) as prerequisites.
    ///
    /// A token only becomes an edge when it names a known id, so prose such
    /// as `None` or `API v1.2` yields nothing. Self references and repeats
    /// are dropped.
    pub fn from_records_known<'a>(
        records: &[TaskRecord],
        extra: impl IntoIterator<Item = &'a TaskId>,
    ) -> Self {
        let mut known: BTreeSet<TaskId> = records.iter().map(|r| r.id.clone()).collect();
        known.extend(extra.into_iter().cloned());

        let mut table = Self::new();
        for record in records {
            let Some(text) = &record.dependencies else {
                continue;
            };
            let mut seen = BTreeSet::new();
            for prerequisite in mentioned_ids(text, &known) {
                if prerequisite == record.id || !seen.insert(prerequisite.clone()) {
                    continue;
                }
                table.add(record.id.clone(), prerequisite);
            }
        }
        table
    }

    /// Edges ordered by dependent id, then prerequisites as declared.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.edges
            .iter()
            .flat_map(|(dependent, prerequisites)| {
                prerequisites
                    .iter()
                    .map(move |p| DependencyEdge::new(dependent.clone(), p.clone()))
            })
            .collect()
    }

    /// Prerequisites declared for `dependent`.
    pub fn prerequisites(&self, dependent: &TaskId) -> &[TaskId] {
        self.edges.get(dependent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}

/// Known ids mentioned in free text, in order of appearance.
///
/// The text is split on anything that cannot appear in an id; a trailing
/// sentence period is ignored.
pub fn mentioned_ids(text: &str, known: &BTreeSet<TaskId>) -> Vec<TaskId> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .map(|token| token.trim_end_matches('.'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let id: TaskId = token.parse().ok()?;
            if known.contains(&id) {
                Some(id)
            } else {
                if token.contains('.') {
                    bplog_debug!("dependency token {:?} names no known task", token);
                }
                None
            }
        })
        .collect()
}

/// Edges present in only one of two tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDrift {
    /// In the authored table, not in the document.
    pub only_in_table: Vec<DependencyEdge>,
    /// In the document, not in the authored table.
    pub only_in_document: Vec<DependencyEdge>,
}

impl TableDrift {
    pub fn between(table: &DependencyTable, document: &DependencyTable) -> Self {
        let authored: BTreeSet<DependencyEdge> = table.edges().into_iter().collect();
        let derived: BTreeSet<DependencyEdge> = document.edges().into_iter().collect();
        Self {
            only_in_table: authored.difference(&derived).cloned().collect(),
            only_in_document: derived.difference(&authored).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.only_in_table.is_empty() && self.only_in_document.is_empty()
    }
}
