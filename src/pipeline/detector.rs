//! Status change detection
//!
//! Works from raw character diffs: after the rejection rules have run, each
//! remaining change is matched against three shapes of deliberate marker
//! edits.

use std::sync::Arc;

use tracing::{debug, trace};

use super::guards::DETECTOR_GUARDS;
use crate::domain::{task_prefix_marker, LineClassifier, StatusModel};
use crate::editor::{Change, Transaction};

/// A possible deliberate status change, valid for one transaction pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeCandidate {
    /// Index of the change that produced the candidate
    pub change_index: usize,
    /// Offset of the marker in the post-edit document
    pub position: usize,
    /// Marker before the edit (space when there was no checkbox)
    pub previous_marker: char,
    /// Marker the edit put in place
    pub typed_marker: char,
    /// A whole task prefix was inserted as a unit
    pub was_full_line_insertion: bool,
    /// The line had no checkbox before the edit
    pub introduced_checkbox: bool,
    /// Detected but must not be cycled
    pub suppressed: bool,
}

impl StatusChangeCandidate {
    /// Offset of the marker inside the change's inserted text
    pub fn offset_in_insert(&self, change: &Change) -> usize {
        self.position - change.from_b
    }
}

/// Finds status change candidates in a transaction
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    model: Arc<StatusModel>,
    classifier: LineClassifier,
}

impl ChangeDetector {
    pub fn new(model: Arc<StatusModel>) -> Self {
        Self {
            model,
            classifier: LineClassifier::new(),
        }
    }

    pub fn with_classifier(mut self, classifier: LineClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Returns the candidates in the transaction; empty when it is rejected
    pub fn detect(&self, tr: &Transaction) -> Vec<StatusChangeCandidate> {
        if !tr.doc_changed() {
            return Vec::new();
        }
        if let Some(reason) = DETECTOR_GUARDS.check(tr) {
            debug!(%reason, "Transaction rejected by change detector");
            return Vec::new();
        }

        let candidates: Vec<_> = tr
            .changes()
            .iter()
            .enumerate()
            .filter_map(|(index, change)| self.classify_change(tr, index, change))
            .collect();

        for candidate in &candidates {
            debug!(
                position = candidate.position,
                from = ?candidate.previous_marker,
                to = ?candidate.typed_marker,
                full_line = candidate.was_full_line_insertion,
                suppressed = candidate.suppressed,
                "Status change candidate"
            );
        }

        candidates
    }

    fn classify_change(
        &self,
        tr: &Transaction,
        index: usize,
        change: &Change,
    ) -> Option<StatusChangeCandidate> {
        if let Some(candidate) = self.full_line_insertion(tr, index, change) {
            trace!(index, "Change is a task prefix insertion");
            return Some(candidate);
        }
        if let Some(candidate) = self.marker_replacement(tr, index, change) {
            trace!(index, "Change is a marker replacement");
            return Some(candidate);
        }
        if let Some(candidate) = self.bracket_insertion(tr, index, change) {
            trace!(index, "Change is a checkbox insertion");
            return Some(candidate);
        }

        trace!(index, from = change.from_a, to = change.to_a, "Change is not a status change");
        None
    }

    /// Marker of the line containing `pos` in the starting document
    fn old_marker(&self, tr: &Transaction, pos: usize) -> Option<char> {
        let line = tr.start_doc().line_at(pos);
        self.classifier.classify(line.text).map(|task| task.marker)
    }

    /// (a) A complete task prefix inserted at a line start
    fn full_line_insertion(
        &self,
        tr: &Transaction,
        index: usize,
        change: &Change,
    ) -> Option<StatusChangeCandidate> {
        let (offset, typed) = task_prefix_marker(&change.insert)?;
        if tr.new_doc().line_at(change.from_b).from != change.from_b {
            return None;
        }

        let previous = self.old_marker(tr, change.from_a);
        Some(StatusChangeCandidate {
            change_index: index,
            position: change.from_b + offset,
            previous_marker: previous.unwrap_or(' '),
            typed_marker: typed,
            was_full_line_insertion: true,
            introduced_checkbox: previous.is_none(),
            suppressed: false,
        })
    }

    /// (b) One marker character replaced by another inside a checkbox
    fn marker_replacement(
        &self,
        tr: &Transaction,
        index: usize,
        change: &Change,
    ) -> Option<StatusChangeCandidate> {
        let removed = single_char(tr.start_doc().slice(change.from_a, change.to_a))?;
        let typed = single_char(&change.insert)?;

        let accepts = |mark: char| mark == ' ' || self.model.is_known_mark(mark);
        if !accepts(removed) || !accepts(typed) {
            return None;
        }

        let old_line = tr.start_doc().line_at(change.from_a);
        let old_task = self.classifier.classify(old_line.text)?;
        if old_line.from + old_task.marker_offset != change.from_a {
            return None;
        }

        let new_line = tr.new_doc().line_at(change.from_b);
        let new_task = self.classifier.classify(new_line.text)?;
        if new_line.from + new_task.marker_offset != change.from_b {
            return None;
        }

        Some(StatusChangeCandidate {
            change_index: index,
            position: change.from_b,
            previous_marker: removed,
            typed_marker: typed,
            was_full_line_insertion: false,
            introduced_checkbox: false,
            suppressed: false,
        })
    }

    /// (c) Text containing both brackets inserted into a line
    fn bracket_insertion(
        &self,
        tr: &Transaction,
        index: usize,
        change: &Change,
    ) -> Option<StatusChangeCandidate> {
        let insert = change.insert.as_str();
        if insert.chars().count() < 2 || insert == "[]" {
            return None;
        }
        if !insert.contains('[') || !insert.contains(']') {
            return None;
        }

        let new_line = tr.new_doc().line_at(change.from_b);
        let new_task = self.classifier.classify(new_line.text)?;
        let position = new_line.from + new_task.marker_offset;
        if position < change.from_b || position >= change.to_b {
            return None;
        }

        let previous = self.old_marker(tr, change.from_a);
        Some(StatusChangeCandidate {
            change_index: index,
            position,
            previous_marker: previous.unwrap_or(' '),
            typed_marker: new_task.marker,
            was_full_line_insertion: false,
            introduced_checkbox: previous.is_none(),
            // Without an earlier marker there is nothing to advance from
            suppressed: previous.is_none(),
        })
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{ChangeSpec, Text};

    fn detector() -> ChangeDetector {
        ChangeDetector::new(Arc::new(StatusModel::default()))
    }

    fn detect(doc: &str, specs: Vec<ChangeSpec>) -> Vec<StatusChangeCandidate> {
        let tr = Transaction::new(Text::from(doc), specs).unwrap();
        detector().detect(&tr)
    }

    #[test]
    fn marker_replacement_is_detected() {
        let candidates = detect("- [ ] Buy milk", vec![ChangeSpec::replace(3, 4, "x")]);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.position, 3);
        assert_eq!(c.previous_marker, ' ');
        assert_eq!(c.typed_marker, 'x');
        assert!(!c.was_full_line_insertion);
        assert!(!c.suppressed);
    }

    #[test]
    fn replacement_on_second_line() {
        let candidates = detect(
            "intro\n  * [/] Task",
            vec![ChangeSpec::replace(11, 12, "x")],
        );
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].position, 11);
        assert_eq!(candidates[0].previous_marker, '/');
    }

    #[test]
    fn letter_outside_alphabet_is_ignored() {
        let candidates = detect("- [ ] Buy milk", vec![ChangeSpec::replace(3, 4, "q")]);
        assert!(candidates.is_empty());
    }

    #[test]
    fn replacement_outside_checkbox_is_ignored() {
        let after_content = detect("- [ ] a x", vec![ChangeSpec::replace(8, 9, "/")]);
        assert!(after_content.is_empty());
        let plain = detect("plain x", vec![ChangeSpec::replace(6, 7, "/")]);
        assert!(plain.is_empty());
    }

    #[test]
    fn full_line_insertion_on_empty_line() {
        let candidates = detect("a\n", vec![ChangeSpec::insert(2, "- [ ] new")]);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert!(c.was_full_line_insertion);
        assert!(c.introduced_checkbox);
        assert_eq!(c.position, 5);
        assert_eq!(c.typed_marker, ' ');
    }

    #[test]
    fn bracket_insertion_into_existing_task() {
        // "- [x] a" with "[x]" retyped as "[/]"
        let candidates = detect("- [x] a", vec![ChangeSpec::replace(2, 5, "[/]")]);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.previous_marker, 'x');
        assert_eq!(c.typed_marker, '/');
        assert!(!c.suppressed);
    }

    #[test]
    fn bracket_insertion_creating_checkbox_is_suppressed() {
        let candidates = detect("- a", vec![ChangeSpec::insert(2, "[x] ")]);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].suppressed);
        assert!(candidates[0].introduced_checkbox);
    }

    #[test]
    fn empty_brackets_are_ignored() {
        assert!(detect("- a", vec![ChangeSpec::insert(2, "[]")]).is_empty());
    }

    #[test]
    fn rejected_transactions_yield_nothing() {
        let tr = Transaction::new(Text::from("- [ ] a"), vec![ChangeSpec::replace(3, 4, "x")])
            .unwrap()
            .with_user_event("input.paste");
        assert!(detector().detect(&tr).is_empty());
    }
}
