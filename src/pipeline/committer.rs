//! Status mutation committer
//!
//! First filter in the pipeline. Rewrites a detected marker edit so the
//! checkbox ends up on the status that follows the previous marker.

use std::sync::Arc;

use tracing::debug;

use super::detector::{ChangeDetector, StatusChangeCandidate};
use crate::domain::{next_status, StatusModel};
use crate::editor::{Annotation, FilterOutcome, Transaction, TransactionFilter, TransactionSpec};

pub struct StatusCommitter {
    model: Arc<StatusModel>,
    detector: ChangeDetector,
}

impl StatusCommitter {
    pub fn new(model: Arc<StatusModel>, detector: ChangeDetector) -> Self {
        Self { model, detector }
    }

    /// The mark to write for a candidate, if it should be rewritten
    fn resolve(&self, candidate: &StatusChangeCandidate) -> Option<char> {
        if candidate.suppressed {
            debug!(position = candidate.position, "Skipping suppressed candidate");
            return None;
        }
        if candidate.was_full_line_insertion && candidate.introduced_checkbox {
            debug!(position = candidate.position, "Skipping newly created task");
            return None;
        }

        let next = next_status(candidate.previous_marker, &self.model)?;
        if next.mark == candidate.typed_marker || next.mark == candidate.previous_marker {
            debug!(
                position = candidate.position,
                mark = ?next.mark,
                "Edit already matches the next status"
            );
            return None;
        }

        debug!(
            position = candidate.position,
            from = ?candidate.previous_marker,
            to = ?next.mark,
            status = %next.status_name,
            "Committing status change"
        );
        Some(next.mark)
    }
}

impl TransactionFilter for StatusCommitter {
    fn name(&self) -> &'static str {
        "status_committer"
    }

    fn filter(&self, tr: &Transaction) -> FilterOutcome {
        let candidates = self.detector.detect(tr);
        if candidates.is_empty() {
            return FilterOutcome::PassThrough;
        }

        let changes: Vec<_> = tr.changes().iter().collect();
        let mut specs = tr.changes().specs();
        let mut committed = false;

        for candidate in &candidates {
            let Some(mark) = self.resolve(candidate) else {
                continue;
            };
            let Some(change) = changes.get(candidate.change_index) else {
                continue;
            };

            let start = candidate.offset_in_insert(change);
            let end = start + candidate.typed_marker.len_utf8();
            let spec = &mut specs[candidate.change_index];
            if end > spec.insert.len() || !spec.insert.is_char_boundary(start) {
                continue;
            }

            let mut buf = [0u8; 4];
            spec.insert.replace_range(start..end, mark.encode_utf8(&mut buf));
            committed = true;
        }

        if !committed {
            return FilterOutcome::PassThrough;
        }

        let mut annotations = tr.annotations().to_vec();
        annotations.push(Annotation::StatusCommit);

        FilterOutcome::Rewrite(TransactionSpec {
            changes: specs,
            selection: tr.selection(),
            annotations,
        })
    }
}
