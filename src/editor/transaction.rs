//! Transactions and transaction specs
//!
//! A [`Transaction`] is a proposed, all-or-nothing edit: the document it
//! starts from, the validated changes, the resulting document, the selection
//! and any annotations attached by the host or by interceptors.

use serde::{Deserialize, Serialize};

use super::change::{ChangeSet, ChangeSpec, EditError, PositionMap};
use super::text::Text;

/// Metadata attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// Host-provided description of the user action (`input.paste`, `set`, ...)
    UserEvent(String),
    /// Marker rewrite produced by the status committer or a status control
    StatusCommit,
    /// Date stamps produced by the lifecycle date manager
    LifecycleDates,
}

/// Cursor or selection range in the post-edit document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    fn clamped(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

/// Replacement description returned by an interceptor.
///
/// Changes are expressed against the starting document of the transaction
/// being replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSpec {
    pub changes: Vec<ChangeSpec>,
    pub selection: Option<Selection>,
    pub annotations: Vec<Annotation>,
}

/// A proposed edit to a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    start: Text,
    changes: ChangeSet,
    doc: Text,
    selection: Option<Selection>,
    annotations: Vec<Annotation>,
}

impl Transaction {
    /// Creates a transaction applying `specs` to `start`
    pub fn new(start: Text, specs: Vec<ChangeSpec>) -> Result<Self, EditError> {
        let changes = ChangeSet::new(specs, &start)?;
        let doc = changes.apply(&start);
        Ok(Self {
            start,
            changes,
            doc,
            selection: None,
            annotations: Vec::new(),
        })
    }

    /// Rebuilds a transaction from an interceptor's spec
    pub fn from_spec(start: &Text, spec: TransactionSpec) -> Result<Self, EditError> {
        let mut tr = Self::new(start.clone(), spec.changes)?;
        tr.selection = spec.selection.map(|s| s.clamped(tr.doc.len()));
        tr.annotations = spec.annotations;
        Ok(tr)
    }

    /// Tags the transaction with a host user event
    pub fn with_user_event(self, event: impl Into<String>) -> Self {
        self.with_annotation(Annotation::UserEvent(event.into()))
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        if !self.annotations.contains(&annotation) {
            self.annotations.push(annotation);
        }
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection.clamped(self.doc.len()));
        self
    }

    /// The document before the edit
    pub fn start_doc(&self) -> &Text {
        &self.start
    }

    /// The document after the edit
    pub fn new_doc(&self) -> &Text {
        &self.doc
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: &Annotation) -> bool {
        self.annotations.contains(annotation)
    }

    /// Returns true if the document content changes
    pub fn doc_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Returns the first user event attached to the transaction
    pub fn user_event(&self) -> Option<&str> {
        self.annotations.iter().find_map(|a| match a {
            Annotation::UserEvent(event) => Some(event.as_str()),
            _ => None,
        })
    }

    /// Returns true if the user event is `event` or a dotted refinement of
    /// it (`input` matches `input.paste`)
    pub fn is_user_event(&self, event: &str) -> bool {
        self.annotations.iter().any(|a| match a {
            Annotation::UserEvent(actual) => {
                actual == event
                    || (actual.len() > event.len()
                        && actual.starts_with(event)
                        && actual.as_bytes()[event.len()] == b'.')
            }
            _ => false,
        })
    }

    /// Maps positions between the start and new documents
    pub fn position_map(&self) -> PositionMap {
        self.changes.position_map()
    }
}
