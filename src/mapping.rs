//! Identifier mapping table: symbolic task id -> tracker id.
//!
//! Owned by a run. The task creator holds it `&mut` and is the only writer;
//! the dependency applier only ever sees `&IdMap`. Entries are written once
//! and never removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::TaskId;
use crate::{bplog_debug, Error, Result};

/// Opaque id assigned by the tracker on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    /// Wrap an id as printed by the tracker.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Symbolic id -> tracker id, filled during creation. Saved as a flat JSON
/// object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap {
    entries: BTreeMap<TaskId, ExternalId>,
}

impl IdMap {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. An id can only be mapped once.
    pub fn insert(&mut self, id: TaskId, external: ExternalId) -> Result<()> {
        if let Some(existing) = self.entries.get(&id) {
            return Err(Error::AlreadyMapped {
                id: id.to_string(),
                existing: existing.to_string(),
            });
        }
        self.entries.insert(id, external);
        Ok(())
    }

    pub fn get(&self, id: &TaskId) -> Option<&ExternalId> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in symbolic id order.
    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, &ExternalId)> {
        self.entries.iter()
    }

    /// Load a mapping saved by [`IdMap::save`].
    pub fn load(path: &Path) -> Result<Self> {
        bplog_debug!("IdMap::load path={}", path.display());
        let map: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        bplog_debug!("IdMap loaded: {} entries", map.len());
        Ok(map)
    }

    /// Write the mapping as a pretty JSON object.
    pub fn save(&self, path: &Path) -> Result<()> {
        bplog_debug!("IdMap::save path={} entries={}", path.display(), self.len());
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
