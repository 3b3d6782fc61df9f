//! Status control seam
//!
//! Builds the transactions an interactive checkbox widget would dispatch.
//! Drawing is left to the host; this only relies on [`next_status`] and the
//! single-marker replacement edit.

mod registry;

pub use registry::{ControlRegistry, TaskKey};

use serde::Serialize;
use thiserror::Error;

use crate::domain::{classify, next_status, StatusModel};
use crate::editor::{Annotation, ChangeSpec, EditError, Text, Transaction};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Line {0} does not exist")]
    NoSuchLine(usize),

    #[error("Line {0} is not a task")]
    NotATask(usize),

    #[error("Unknown status '{0}'")]
    UnknownStatus(String),

    #[error("No status to advance to")]
    NothingToCycle,

    #[error(transparent)]
    Edit(#[from] EditError),
}

/// One entry of the status menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub status: String,
    pub mark: char,
    /// The task currently shows this status
    pub current: bool,
    /// Clicking would advance to this status
    pub next: bool,
}

pub struct StatusControl<'a> {
    model: &'a StatusModel,
}

impl<'a> StatusControl<'a> {
    pub fn new(model: &'a StatusModel) -> Self {
        Self { model }
    }

    /// Marker offset and marker of the task on a 1-based line
    fn locate(&self, text: &Text, line: usize) -> Result<(usize, char), ControlError> {
        let found = text.line(line).ok_or(ControlError::NoSuchLine(line))?;
        let task = classify(found.text).ok_or(ControlError::NotATask(line))?;
        Ok((found.from + task.marker_offset, task.marker))
    }

    fn replace_marker(
        text: &Text,
        at: usize,
        old: char,
        new: char,
    ) -> Result<Transaction, ControlError> {
        let spec = ChangeSpec::replace(at, at + old.len_utf8(), new.to_string());
        Ok(Transaction::new(text.clone(), vec![spec])?)
    }

    /// The edit a plain checkbox click makes: an empty box becomes `x`,
    /// anything else is cleared. The pipeline turns it into a cycle step.
    pub fn click(&self, text: &Text, line: usize) -> Result<Transaction, ControlError> {
        let (at, marker) = self.locate(text, line)?;
        let toggled = if marker == ' ' { 'x' } else { ' ' };
        Self::replace_marker(text, at, marker, toggled)
    }

    /// Advances the task directly to the next status in its cycle
    pub fn advance(&self, text: &Text, line: usize) -> Result<Transaction, ControlError> {
        let (at, marker) = self.locate(text, line)?;
        let next = next_status(marker, self.model).ok_or(ControlError::NothingToCycle)?;
        let tr = Self::replace_marker(text, at, marker, next.mark)?;
        Ok(tr.with_annotation(Annotation::StatusCommit))
    }

    /// Sets the task to a named status
    pub fn select(
        &self,
        text: &Text,
        line: usize,
        status: &str,
    ) -> Result<Transaction, ControlError> {
        let mark = self
            .model
            .mark_of(status)
            .ok_or_else(|| ControlError::UnknownStatus(status.to_string()))?;
        let (at, marker) = self.locate(text, line)?;
        let tr = Self::replace_marker(text, at, marker, mark)?;
        Ok(tr.with_annotation(Annotation::StatusCommit))
    }

    /// Menu entries for a task showing `marker`
    pub fn menu(&self, marker: char) -> Vec<MenuEntry> {
        let next = next_status(marker, self.model);

        self.model
            .statuses
            .iter()
            .filter_map(|status| {
                let mark = self.model.mark_of(status)?;
                Some(MenuEntry {
                    status: status.clone(),
                    mark,
                    current: mark == marker,
                    next: next.as_ref().is_some_and(|n| n.status_name == *status),
                })
            })
            .collect()
    }
}
