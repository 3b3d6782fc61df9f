//! Document editing commands
//!
//! Each command builds a transaction against a markdown file, resolves it
//! through the status pipeline and writes the result back.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::app::Session;
use super::output::Output;
use crate::control::StatusControl;
use crate::editor::{Annotation, ChangeSpec, Selection, Text, Transaction};
use crate::storage::MarkdownFile;

/// A transaction recorded as JSON
#[derive(Debug, Deserialize)]
pub struct RecordedTransaction {
    pub changes: Vec<ChangeSpec>,
    #[serde(default)]
    pub user_event: Option<String>,
    #[serde(default)]
    pub selection: Option<Selection>,
}

impl RecordedTransaction {
    pub fn into_transaction(self, doc: Text) -> Result<Transaction> {
        let mut tr = Transaction::new(doc, self.changes)
            .context("Recorded changes do not fit the document")?;
        if let Some(event) = self.user_event {
            tr = tr.with_user_event(event);
        }
        if let Some(selection) = self.selection {
            tr = tr.with_selection(selection);
        }
        Ok(tr)
    }
}

#[derive(Serialize)]
struct LineChange {
    line: usize,
    before: String,
    after: String,
}

#[derive(Serialize)]
struct EditReport<'a> {
    file: &'a Path,
    written: bool,
    annotations: Vec<String>,
    lines: Vec<LineChange>,
}

fn annotation_label(annotation: &Annotation) -> String {
    match annotation {
        Annotation::UserEvent(event) => format!("user_event:{}", event),
        Annotation::StatusCommit => "status_commit".to_string(),
        Annotation::LifecycleDates => "lifecycle_dates".to_string(),
    }
}

/// Lines of the new document touched by the transaction
fn changed_lines(tr: &Transaction) -> Vec<LineChange> {
    let mut lines: Vec<LineChange> = Vec::new();

    for change in tr.changes().iter() {
        let after = tr.new_doc().line_at(change.from_b);
        if lines.iter().any(|l| l.line == after.number) {
            continue;
        }
        let before = tr.start_doc().line_at(change.from_a);
        lines.push(LineChange {
            line: after.number,
            before: before.text.to_string(),
            after: after.text.to_string(),
        });
    }

    lines
}

/// Resolves a transaction, writes the result and reports it
fn commit(
    output: &Output,
    session: &Session,
    file: &MarkdownFile,
    tr: Transaction,
    dry_run: bool,
) -> Result<()> {
    let pipeline = session.pipeline()?;
    let resolved = pipeline.resolve(tr);

    let written = !dry_run && resolved.doc_changed();
    if written {
        file.write(resolved.new_doc())?;
    }

    let report = EditReport {
        file: file.path(),
        written,
        annotations: resolved
            .annotations()
            .iter()
            .map(annotation_label)
            .collect(),
        lines: changed_lines(&resolved),
    };

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    if report.lines.is_empty() {
        output.line("No changes");
    }
    for line in &report.lines {
        output.line(&format!("{}: {}", line.line, line.after));
    }
    if dry_run {
        output.line("(dry run, file not written)");
    }
    Ok(())
}

pub fn cycle(output: &Output, session: &Session, path: &Path, line: usize) -> Result<()> {
    let file = MarkdownFile::new(path);
    let text = file.read()?;
    let tr = StatusControl::new(&session.settings.statuses).click(&text, line)?;
    commit(output, session, &file, tr, false)
}

pub fn set(
    output: &Output,
    session: &Session,
    path: &Path,
    line: usize,
    status: &str,
) -> Result<()> {
    let file = MarkdownFile::new(path);
    let text = file.read()?;
    let tr = StatusControl::new(&session.settings.statuses).select(&text, line, status)?;
    commit(output, session, &file, tr, false)
}

pub fn replay(
    output: &Output,
    session: &Session,
    path: &Path,
    transaction: &Path,
    dry_run: bool,
) -> Result<()> {
    let file = MarkdownFile::new(path);
    let text = file.read()?;

    let content = fs::read_to_string(transaction)
        .with_context(|| format!("Failed to read transaction: {}", transaction.display()))?;
    let recorded: RecordedTransaction = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transaction: {}", transaction.display()))?;

    let tr = recorded.into_transaction(text)?;
    commit(output, session, &file, tr, dry_run)
}
