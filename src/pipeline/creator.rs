//! Task creation phase.
//!
//! Turns parsed records into tracker tasks, one synchronous call per
//! record, and fills the mapping table with the ids the tracker returns.
//! A failed record is reported and left unmapped; the next record is still
//! attempted.

use crate::config::Defaults;
use crate::core::{TaskId, TaskRecord};
use crate::mapping::{ExternalId, IdMap};
use crate::tracker::{CreateRequest, Tracker};
use crate::{bplog, bplog_debug, bplog_warn};

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    /// Created and mapped.
    Created(ExternalId),
    /// Already mapped before this record was reached; not created again.
    AlreadyMapped(ExternalId),
    /// The tracker reported an error.
    Failed(String),
}

/// Per-record outcomes, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationReport {
    pub outcomes: Vec<(TaskId, CreationOutcome)>,
}

impl CreationReport {
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::Created(_)))
    }

    pub fn already_mapped(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::AlreadyMapped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CreationOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&CreationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Creates tracker tasks from records.
pub struct TaskCreator {
    defaults: Defaults,
}

impl TaskCreator {
    pub fn new(defaults: Defaults) -> Self {
        Self { defaults }
    }

    /// Build the tracker request for a record, filling in default type and
    /// priority and appending the symbolic id to the labels.
    pub fn request_for(&self, record: &TaskRecord) -> CreateRequest {
        CreateRequest {
            title: record.title.clone(),
            task_type: record
                .task_type
                .clone()
                .unwrap_or_else(|| self.defaults.effective_task_type().to_string()),
            priority: record
                .priority
                .clone()
                .unwrap_or_else(|| self.defaults.effective_priority().to_string()),
            body: record.render_body(),
            estimate: record.estimate,
            labels: record.tracker_labels(),
        }
    }

    /// Create one record. The mapping is only written on success.
    pub fn create(
        &self,
        record: &TaskRecord,
        tracker: &mut dyn Tracker,
        map: &mut IdMap,
    ) -> CreationOutcome {
        if let Some(existing) = map.get(&record.id) {
            bplog_warn!("{} already mapped to {}, not creating", record.id, existing);
            return CreationOutcome::AlreadyMapped(existing.clone());
        }

        bplog_debug!("creating {}: {}", record.id, record.title);
        let request = self.request_for(record);
        match tracker.create(&request) {
            Ok(external) => match map.insert(record.id.clone(), external.clone()) {
                Ok(()) => CreationOutcome::Created(external),
                Err(e) => CreationOutcome::Failed(e.to_string()),
            },
            Err(e) => {
                bplog_warn!("failed to create {}: {}", record.id, e);
                CreationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Create every record in order.
    pub fn create_all(
        &self,
        records: &[TaskRecord],
        tracker: &mut dyn Tracker,
        map: &mut IdMap,
    ) -> CreationReport {
        self.create_all_with(records, tracker, map, |_, _| {})
    }

    /// Like [`TaskCreator::create_all`], calling `on_outcome` after each
    /// record so callers can report progress as it happens.
    pub fn create_all_with<F>(
        &self,
        records: &[TaskRecord],
        tracker: &mut dyn Tracker,
        map: &mut IdMap,
        mut on_outcome: F,
    ) -> CreationReport
    where
        F: FnMut(&TaskRecord, &CreationOutcome),
    {
        let mut report = CreationReport::default();
        for record in records {
            let outcome = self.create(record, tracker, map);
            on_outcome(record, &outcome);
            report.outcomes.push((record.id.clone(), outcome));
        }
        bplog!(
            "creation finished: {} created, {} already mapped, {} failed",
            report.created(),
            report.already_mapped(),
            report.failed()
        );
        report
    }
}
