//! Task record model extracted from a plan document.
//!
//! A [`TaskRecord`] is the parsed form of one `### Task:` block. It is
//! immutable after parsing and only its id outlives task creation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::Error;

/// Human-authored hierarchical task identifier, e.g. `hel.2.3`.
///
/// Ordering is segment-wise: numeric segments compare as numbers, so
/// `hel.2.1` sorts before `hel.10.1` (a plain string sort would put it
/// after).
///
/// Ids read from config or mapping files go through the same validation
/// and trimming as ids parsed from the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Borrow the id as written in the document.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted segments of the id.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The enclosing id (`hel.2.3` -> `hel.2`), if any.
    pub fn parent(&self) -> Option<TaskId> {
        self.0
            .rsplit_once('.')
            .map(|(head, _)| TaskId(head.to_string()))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) || s.split('.').any(str::is_empty) {
            return Err(Error::InvalidTaskId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TaskId {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl Ord for TaskId {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments();
        let mut right = other.segments();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                        _ => a.cmp(b),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One task block as extracted from the document.
///
/// Absent optional fields stay `None`; no value is validated against an
/// enumeration, so `task_type` and `priority` are carried as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Estimate in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<u32>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance: Option<String>,
    /// Dependency text exactly as declared; informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<String>,
}

impl TaskRecord {
    /// Create a record with only the required fields set.
    pub fn new(id: TaskId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            task_type: None,
            priority: None,
            estimate: None,
            labels: Vec::new(),
            description: None,
            deliverables: None,
            acceptance: None,
            dependencies: None,
        }
    }

    /// Render the body handed to the tracker.
    ///
    /// Sections appear in a fixed order and only when present; the
    /// `Task ID:` marker line always closes the body.
    pub fn render_body(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(description) = &self.description {
            parts.push(description.clone());
            parts.push(String::new());
        }
        if let Some(deliverables) = &self.deliverables {
            parts.push("DELIVERABLES:".to_string());
            parts.push(deliverables.clone());
            parts.push(String::new());
        }
        if let Some(acceptance) = &self.acceptance {
            parts.push("ACCEPTANCE CRITERIA:".to_string());
            parts.push(acceptance.clone());
            parts.push(String::new());
        }
        if let Some(dependencies) = &self.dependencies {
            parts.push(format!("Dependencies: {}", dependencies));
            parts.push(String::new());
        }
        parts.push(format!("Task ID: {}", self.id));

        parts.join("\n")
    }

    /// Declared labels with the symbolic id appended.
    pub fn tracker_labels(&self) -> Vec<String> {
        let mut labels = self.labels.clone();
        labels.push(self.id.to_string());
        labels
    }
}
