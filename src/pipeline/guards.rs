//! Rejection rules shared by the pipeline filters
//!
//! Each rule is an independent predicate over a whole transaction. Rules are
//! evaluated in declaration order and the first match rejects the
//! transaction.

use std::fmt;

use crate::domain::{classify, is_task_line};
use crate::editor::{Annotation, Change, Transaction};

/// Why a transaction was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Produced by one of the pipeline's own filters
    SelfAnnotated,
    /// Paste or bulk `set`
    BulkUserEvent,
    /// Lines cut from one place and reinserted elsewhere
    Move,
    /// Whitespace added or removed at a line start
    Indentation,
    /// A lone `-` bullet deleted at a line start
    BulletDeletion,
    /// Newline or wiki link brackets inserted
    StructuralInsert,
    /// Whole document replaced by one task line
    DocumentReplaced,
    /// A deletion alongside an edit next to a task marker
    DeletionNearMarker,
}

impl RejectReason {
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::SelfAnnotated => "self_annotated",
            RejectReason::BulkUserEvent => "bulk_user_event",
            RejectReason::Move => "move",
            RejectReason::Indentation => "indentation",
            RejectReason::BulletDeletion => "bullet_deletion",
            RejectReason::StructuralInsert => "structural_insert",
            RejectReason::DocumentReplaced => "document_replaced",
            RejectReason::DeletionNearMarker => "deletion_near_marker",
        }
    }

    fn applies(&self, tr: &Transaction) -> bool {
        match self {
            RejectReason::SelfAnnotated => false,
            RejectReason::BulkUserEvent => {
                tr.is_user_event("input.paste") || tr.is_user_event("set")
            }
            RejectReason::Move => is_move(tr),
            RejectReason::Indentation => tr.changes().iter().any(|c| is_indentation(tr, c)),
            RejectReason::BulletDeletion => {
                tr.changes().iter().any(|c| is_bullet_deletion(tr, c))
            }
            RejectReason::StructuralInsert => tr.changes().iter().any(is_structural_insert),
            RejectReason::DocumentReplaced => replaces_document(tr),
            RejectReason::DeletionNearMarker => deletion_near_marker(tr),
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An ordered set of rejection rules
#[derive(Debug, Clone, Copy)]
pub struct Guards {
    /// Annotations that mark a transaction as already handled
    owned: &'static [Annotation],
    rules: &'static [RejectReason],
}

/// Rules applied before status change detection
pub const DETECTOR_GUARDS: Guards = Guards {
    owned: &[Annotation::StatusCommit, Annotation::LifecycleDates],
    rules: &[
        RejectReason::BulkUserEvent,
        RejectReason::Move,
        RejectReason::Indentation,
        RejectReason::BulletDeletion,
        RejectReason::StructuralInsert,
        RejectReason::DocumentReplaced,
        RejectReason::DeletionNearMarker,
    ],
};

/// Rules applied before lifecycle dates are derived
pub const LIFECYCLE_GUARDS: Guards = Guards {
    owned: &[Annotation::LifecycleDates],
    rules: &[
        RejectReason::BulkUserEvent,
        RejectReason::Move,
        RejectReason::Indentation,
        RejectReason::BulletDeletion,
        RejectReason::StructuralInsert,
        RejectReason::DocumentReplaced,
        RejectReason::DeletionNearMarker,
    ],
};

impl Guards {
    /// Returns the first rule rejecting the transaction
    pub fn check(&self, tr: &Transaction) -> Option<RejectReason> {
        if self.owned.iter().any(|a| tr.has_annotation(a)) {
            return Some(RejectReason::SelfAnnotated);
        }
        self.rules.iter().copied().find(|rule| rule.applies(tr))
    }
}

/// Trimmed non-blank lines of a text
fn significant_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// A single short token, such as a marker, is never treated as moved text
fn is_trivial(lines: &[&str]) -> bool {
    lines.len() == 1 && lines[0].chars().count() <= 1
}

fn is_move(tr: &Transaction) -> bool {
    let doc = tr.start_doc();
    let changes: Vec<&Change> = tr.changes().iter().collect();
    let deleted: Vec<Vec<&str>> = changes
        .iter()
        .map(|c| significant_lines(doc.slice(c.from_a, c.to_a)))
        .collect();
    let inserted: Vec<Vec<&str>> = changes
        .iter()
        .map(|c| significant_lines(&c.insert))
        .collect();

    for (i, removed) in deleted.iter().enumerate() {
        if removed.is_empty() || is_trivial(removed) {
            continue;
        }

        let reinserted_elsewhere = inserted
            .iter()
            .enumerate()
            .any(|(j, added)| i != j && added == removed);
        if reinserted_elsewhere {
            return true;
        }

        // Lines swapped within one replacement
        let added = &inserted[i];
        if removed.len() >= 2 && added != removed {
            let mut a = removed.clone();
            let mut b = added.clone();
            a.sort_unstable();
            b.sort_unstable();
            if a == b {
                return true;
            }
        }
    }

    false
}

fn is_indentation(tr: &Transaction, change: &Change) -> bool {
    let doc = tr.start_doc();
    let removed = doc.slice(change.from_a, change.to_a);
    if removed.contains('\n') || change.insert.contains('\n') {
        return false;
    }
    if !removed.trim().is_empty() || !change.insert.trim().is_empty() {
        return false;
    }

    let line = doc.line_at(change.from_a);
    doc.slice(line.from, change.from_a).trim().is_empty()
}

fn is_structural_insert(change: &Change) -> bool {
    let insert = change.insert.as_str();
    insert.contains('\n') || insert.contains("[[") || insert.contains("]]")
}

fn is_bullet_deletion(tr: &Transaction, change: &Change) -> bool {
    if change.inserts() {
        return false;
    }
    let doc = tr.start_doc();
    if doc.slice(change.from_a, change.to_a) != "-" {
        return false;
    }
    let line = doc.line_at(change.from_a);
    doc.slice(line.from, change.from_a).trim().is_empty()
}

fn replaces_document(tr: &Transaction) -> bool {
    let doc = tr.start_doc();
    let mut changes = tr.changes().iter();
    let (Some(change), None) = (changes.next(), changes.next()) else {
        return false;
    };

    !doc.is_empty()
        && change.from_a == 0
        && change.to_a == doc.len()
        && !change.insert.contains('\n')
        && is_task_line(&change.insert)
}

fn deletion_near_marker(tr: &Transaction) -> bool {
    let changes = tr.changes();
    if changes.len() < 2 {
        return false;
    }
    if !changes.iter().any(|c| c.deletes() && !c.inserts()) {
        return false;
    }

    let doc = tr.start_doc();
    changes.iter().any(|c| {
        let line = doc.line_at(c.from_a);
        let Some(task) = classify(line.text) else {
            return false;
        };
        // `[`, marker and `]`
        let open = line.from + task.marker_offset - 1;
        let close = line.from + task.marker_end() + 1;
        c.from_a <= close && c.to_a >= open
    })
}
