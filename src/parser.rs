//! Plan document parser.
//!
//! A plan is a Markdown file with one `### Task: <title>` section per task.
//! Fields inside a section are introduced by bold labels:
//!
//! ```text
//! ### Task: Build the parser
//!
//! **ID:** hel.2.2
//! **Type:** task
//! **Priority:** P1
//! **Estimate:** 90 minutes
//! **Labels:** parser, core
//! **Dependencies:** hel.2.1
//!
//! **Description:**
//!
//! Free text, kept verbatim.
//!
//! **Deliverables:**
//! - src/parser.rs
//!
//! **Acceptance Criteria:**
//! - [ ] tests pass
//!
//! ---
//! ```
//!
//! Each section is scanned line by line with a cursor on the current
//! multi-line field. The cursor is flushed by the next recognized label, a
//! horizontal rule, or the end of the section. Nothing here is fatal: a
//! section without an id or a title is dropped and counted.
//!
//! ## Example
//!
//! ```
//! use beadplan::parser::parse_document;
//!
//! let doc = "### Task: Root\n**ID:** root\n\n### Task: Child\n**ID:** child\n";
//! let parsed = parse_document(doc);
//! assert_eq!(parsed.records.len(), 2);
//! assert_eq!(parsed.records[1].id.as_str(), "child");
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::core::{TaskId, TaskRecord};
use crate::{bplog_debug, bplog_trace};

/// `### Task: <title>` section heading.
static TASK_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{0,3}###\s+Task:(.*)$").unwrap());

/// Bold label at the start of a line, optionally behind a list bullet.
/// Accepts both `**Name:**` and `**Name**:`.
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*+]\s+)?\*\*([^*]+?)(?::\*\*|\*\*:)(.*)$").unwrap()
});

static ESTIMATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+minutes\b").unwrap());

/// Labels the parser understands. Any other bold text is plain content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Type,
    Priority,
    Estimate,
    Labels,
    Dependencies,
    Description,
    Deliverables,
    Acceptance,
}

impl Field {
    fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Field::Id),
            "type" => Some(Field::Type),
            "priority" => Some(Field::Priority),
            "estimate" => Some(Field::Estimate),
            "labels" => Some(Field::Labels),
            "dependencies" => Some(Field::Dependencies),
            "description" => Some(Field::Description),
            "deliverables" => Some(Field::Deliverables),
            "acceptance criteria" => Some(Field::Acceptance),
            _ => None,
        }
    }

    fn is_multiline(self) -> bool {
        matches!(
            self,
            Field::Description | Field::Deliverables | Field::Acceptance
        )
    }
}

/// Result of parsing a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// One record per section that had both an id and a title.
    pub records: Vec<TaskRecord>,
    /// Sections dropped for lacking an id or a title.
    pub dropped: usize,
}

impl ParsedDocument {
    /// Number of `### Task:` sections seen.
    pub fn block_count(&self) -> usize {
        self.records.len() + self.dropped
    }
}

/// One `### Task:` section: its heading title and the lines below it.
struct Block<'a> {
    title: String,
    lines: Vec<&'a str>,
}

/// Fields collected from one block. The first occurrence of a label wins.
#[derive(Default)]
struct BlockFields {
    id: Option<TaskId>,
    task_type: Option<String>,
    priority: Option<String>,
    estimate: Option<u32>,
    labels: Option<Vec<String>>,
    dependencies: Option<String>,
    description: Option<String>,
    deliverables: Option<String>,
    acceptance: Option<String>,
}

impl BlockFields {
    fn set_single(&mut self, field: Field, value: &str) {
        let value = value.trim();
        match field {
            Field::Id => set_once(&mut self.id, first_token(value).and_then(|t| t.parse().ok())),
            Field::Type => set_once(&mut self.task_type, first_token(value).map(String::from)),
            Field::Priority => set_once(&mut self.priority, first_token(value).map(String::from)),
            Field::Estimate => set_once(&mut self.estimate, parse_estimate(value)),
            Field::Labels => set_once(&mut self.labels, parse_labels(value)),
            Field::Dependencies => {
                set_once(&mut self.dependencies, non_empty(value).map(String::from))
            }
            Field::Description | Field::Deliverables | Field::Acceptance => {}
        }
    }

    fn set_multiline(&mut self, field: Field, lines: &[&str]) {
        let content = finish_content(lines);
        match field {
            Field::Description => set_once(&mut self.description, content),
            Field::Deliverables => set_once(&mut self.deliverables, content),
            Field::Acceptance => set_once(&mut self.acceptance, content),
            _ => {}
        }
    }

    fn into_record(self, title: &str) -> Option<TaskRecord> {
        let id = self.id?;
        let title = non_empty(title.trim())?;
        Some(TaskRecord {
            id,
            title: title.to_string(),
            task_type: self.task_type,
            priority: self.priority,
            estimate: self.estimate,
            labels: self.labels.unwrap_or_default(),
            description: self.description,
            deliverables: self.deliverables,
            acceptance: self.acceptance,
            dependencies: self.dependencies,
        })
    }
}

/// Parse a plan document into task records.
pub fn parse_document(text: &str) -> ParsedDocument {
    let mut parsed = ParsedDocument::default();

    for block in split_blocks(text) {
        match parse_block(&block) {
            Some(record) => {
                bplog_debug!("parsed task {}: {}", record.id, record.title);
                parsed.records.push(record);
            }
            None => {
                bplog_debug!("dropped task block {:?}: missing id or title", block.title);
                parsed.dropped += 1;
            }
        }
    }

    parsed
}

/// Partition the document at `### Task:` headings. Text before the first
/// heading belongs to no block.
fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let mut blocks: Vec<Block<'_>> = Vec::new();
    for line in text.lines() {
        if let Some(caps) = TASK_HEADING_RE.captures(line) {
            blocks.push(Block {
                title: caps[1].trim().to_string(),
                lines: Vec::new(),
            });
        } else if let Some(block) = blocks.last_mut() {
            block.lines.push(line);
        }
    }
    blocks
}

fn parse_block(block: &Block<'_>) -> Option<TaskRecord> {
    let mut fields = BlockFields::default();
    let mut cursor: Option<(Field, Vec<&str>)> = None;

    for &line in &block.lines {
        if is_horizontal_rule(line) {
            if let Some((field, lines)) = cursor.take() {
                fields.set_multiline(field, &lines);
            }
            continue;
        }

        if let Some((field, rest)) = match_label(line) {
            if let Some((open, lines)) = cursor.take() {
                fields.set_multiline(open, &lines);
            }
            if field.is_multiline() {
                cursor = Some((field, vec![rest.trim_start()]));
            } else {
                fields.set_single(field, rest);
            }
            continue;
        }

        if let Some((_, lines)) = cursor.as_mut() {
            lines.push(line);
        }
    }

    if let Some((field, lines)) = cursor.take() {
        fields.set_multiline(field, &lines);
    }

    bplog_trace!("block {:?}: {} lines scanned", block.title, block.lines.len());
    fields.into_record(&block.title)
}

/// A recognized bold label at the start of `line`, with the rest of the line.
fn match_label(line: &str) -> Option<(Field, &str)> {
    let caps = LABEL_RE.captures(line)?;
    let field = Field::from_label(caps.get(1)?.as_str())?;
    Some((field, caps.get(2)?.as_str()))
}

/// `---`, `***`, `___` (three or more, spaces allowed between).
fn is_horizontal_rule(line: &str) -> bool {
    let marks: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
    match marks.first() {
        Some(&first) if matches!(first, '-' | '*' | '_') => {
            marks.len() >= 3 && marks.iter().all(|&c| c == first)
        }
        _ => false,
    }
}

/// Multi-line content: verbatim, minus surrounding blank lines and
/// trailing whitespace.
fn finish_content(lines: &[&str]) -> Option<String> {
    let start = lines.iter().position(|l| !l.trim().is_empty())?;
    let content = lines[start..].join("\n");
    non_empty(content.trim_end()).map(String::from)
}

fn parse_estimate(value: &str) -> Option<u32> {
    ESTIMATE_RE.captures(value)?[1].parse().ok()
}

fn parse_labels(value: &str) -> Option<Vec<String>> {
    let labels: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels)
    }
}

fn first_token(value: &str) -> Option<&str> {
    value.split_whitespace().next()
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}
