//! Task tracker collaborator.
//!
//! [`Tracker`] is the seam between the import pipeline and whatever stores
//! tasks. [`BdTracker`] drives the `bd` command line; [`DryRunTracker`]
//! only records the calls it would have made.

use std::io::Write;
use std::process::{Command, Output};

use tempfile::Builder;

use crate::mapping::ExternalId;
use crate::{bplog_debug, bplog_trace, bplog_warn, Error, Result};

/// Everything the tracker needs to create one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub title: String,
    pub task_type: String,
    pub priority: String,
    pub body: String,
    pub estimate: Option<u32>,
    pub labels: Vec<String>,
}

/// External task tracker. Calls are synchronous and made one at a time.
pub trait Tracker {
    /// Create a task and return the id the tracker assigned to it.
    fn create(&mut self, request: &CreateRequest) -> Result<ExternalId>;

    /// Record that `dependent` is blocked until `prerequisite` is done.
    fn add_dependency(&mut self, dependent: &ExternalId, prerequisite: &ExternalId)
        -> Result<()>;
}

/// Tracker backed by the `bd` CLI.
pub struct BdTracker {
    program: String,
}

impl BdTracker {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the tracker program can be found on `PATH`.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    /// Arguments for `bd create`, with the body read from `body_file`.
    pub fn create_args(request: &CreateRequest, body_file: &str) -> Vec<String> {
        let mut args = vec![
            "create".to_string(),
            request.title.clone(),
            "--type".to_string(),
            request.task_type.clone(),
            "--priority".to_string(),
            request.priority.clone(),
            "--body-file".to_string(),
            body_file.to_string(),
            "--silent".to_string(),
        ];
        if let Some(estimate) = request.estimate {
            args.push("--estimate".to_string());
            args.push(estimate.to_string());
        }
        if !request.labels.is_empty() {
            args.push("--labels".to_string());
            args.push(request.labels.join(","));
        }
        args
    }

    /// Arguments for `bd dep add`.
    pub fn dep_args(dependent: &ExternalId, prerequisite: &ExternalId) -> Vec<String> {
        vec![
            "dep".to_string(),
            "add".to_string(),
            dependent.to_string(),
            prerequisite.to_string(),
        ]
    }

    fn run(&self, args: &[String]) -> Result<Output> {
        bplog_debug!("BdTracker::run {} {}", self.program, args.join(" "));
        let output = Command::new(&self.program).args(args).output()?;
        if !output.status.success() {
            let err = format!(
                "`{} {}` failed ({}): {}",
                self.program,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            bplog_warn!("{}", err);
            return Err(Error::Tracker(err));
        }
        Ok(output)
    }
}

impl Default for BdTracker {
    fn default() -> Self {
        Self::new("bd")
    }
}

impl Tracker for BdTracker {
    fn create(&mut self, request: &CreateRequest) -> Result<ExternalId> {
        // Dropping the staging file deletes it, whatever the outcome.
        let mut staging = Builder::new()
            .prefix("beadplan-body-")
            .suffix(".txt")
            .tempfile()?;
        staging.write_all(request.body.as_bytes())?;
        staging.flush()?;
        bplog_trace!("staged body at {}:\n{}", staging.path().display(), request.body);

        let body_file = staging.path().display().to_string();
        let output = self.run(&Self::create_args(request, &body_file))?;

        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            return Err(Error::Tracker(format!(
                "`{} create` printed no id for {:?}",
                self.program, request.title
            )));
        }
        bplog_debug!("created {:?} as {}", request.title, id);
        Ok(ExternalId::new(id))
    }

    fn add_dependency(
        &mut self,
        dependent: &ExternalId,
        prerequisite: &ExternalId,
    ) -> Result<()> {
        self.run(&Self::dep_args(dependent, prerequisite))?;
        bplog_debug!("dependency added: {} depends on {}", dependent, prerequisite);
        Ok(())
    }
}

/// A call a [`DryRunTracker`] was asked to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedCall {
    Create {
        request: CreateRequest,
        assigned: ExternalId,
    },
    AddDependency {
        dependent: ExternalId,
        prerequisite: ExternalId,
    },
}

/// Tracker that runs nothing. Creations get sequential ids `dry-1`,
/// `dry-2`, ... so the dependency phase can still resolve them.
#[derive(Debug, Default)]
pub struct DryRunTracker {
    calls: Vec<PlannedCall>,
    next_id: usize,
}

impl DryRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PlannedCall] {
        &self.calls
    }
}

impl Tracker for DryRunTracker {
    fn create(&mut self, request: &CreateRequest) -> Result<ExternalId> {
        self.next_id += 1;
        let assigned = ExternalId::new(format!("dry-{}", self.next_id));
        self.calls.push(PlannedCall::Create {
            request: request.clone(),
            assigned: assigned.clone(),
        });
        Ok(assigned)
    }

    fn add_dependency(
        &mut self,
        dependent: &ExternalId,
        prerequisite: &ExternalId,
    ) -> Result<()> {
        self.calls.push(PlannedCall::AddDependency {
            dependent: dependent.clone(),
            prerequisite: prerequisite.clone(),
        });
        Ok(())
    }
}
