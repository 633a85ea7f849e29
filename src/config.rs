use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{DependencyTable, TaskId};
use crate::mapping::{ExternalId, IdMap};
use crate::{bplog_debug, Result};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "beadplan.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub defaults: Defaults,
    /// Ids of items that already exist in the tracker, e.g. the epic.
    #[serde(default)]
    pub seed: BTreeMap<TaskId, ExternalId>,
    /// Hand-maintained dependency edges: dependent -> prerequisites.
    #[serde(default)]
    pub dependencies: DependencyTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackerConfig {
    pub command: Option<String>,
}

/// Values used when a task block leaves a field out.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Defaults {
    pub task_type: Option<String>,
    pub priority: Option<String>,
}

impl Defaults {
    pub fn effective_task_type(&self) -> &str {
        self.task_type.as_deref().unwrap_or("task")
    }

    pub fn effective_priority(&self) -> &str {
        self.priority.as_deref().unwrap_or("P2")
    }
}

impl Config {
    pub fn effective_command(&self) -> &str {
        self.tracker.command.as_deref().unwrap_or("bd")
    }

    /// Load `path`, or `./beadplan.toml` when no path is given. A missing
    /// default file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        bplog_debug!("Config::load path={} explicit={}", path.display(), explicit);
        if !explicit && !path.exists() {
            bplog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(&path)?)?;
        bplog_debug!(
            "Config loaded: command={:?}, seed={}, dependency edges={}",
            config.tracker.command,
            config.seed.len(),
            config.dependencies.edge_count()
        );
        Ok(config)
    }

    /// A fresh mapping table holding the configured seed ids.
    pub fn seeded_map(&self) -> Result<IdMap> {
        let mut map = IdMap::new();
        for (id, external) in &self.seed {
            map.insert(id.clone(), external.clone())?;
        }
        Ok(map)
    }
}
