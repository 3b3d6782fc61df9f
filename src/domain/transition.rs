//! Status transitions between two versions of a task line

use super::line::classify;
use super::status::{StatusModel, StatusType};

/// A marker change on one task line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub old_marker: char,
    pub new_marker: char,
    pub old_type: StatusType,
    pub new_type: StatusType,
}

impl StatusTransition {
    /// Returns true if the coarse status type changed
    pub fn changes_type(&self) -> bool {
        self.old_type != self.new_type
    }
}

/// Compares the marker of a line before and after an edit.
///
/// Both versions must be task lines and the marker must differ.
pub fn detect_status_transition(
    old_line: &str,
    new_line: &str,
    model: &StatusModel,
) -> Option<StatusTransition> {
    let old = classify(old_line)?;
    let new = classify(new_line)?;
    if old.marker == new.marker {
        return None;
    }

    Some(StatusTransition {
        old_marker: old.marker,
        new_marker: new.marker,
        old_type: model.type_of(old.marker),
        new_type: model.type_of(new.marker),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_change() {
        let model = StatusModel::default();
        let transition = detect_status_transition("- [ ] a", "- [/] a", &model).unwrap();
        assert_eq!(transition.old_type, StatusType::NotStarted);
        assert_eq!(transition.new_type, StatusType::InProgress);
        assert!(transition.changes_type());
    }

    #[test]
    fn same_type_transition() {
        let model = StatusModel::default();
        let transition = detect_status_transition("- [x] a", "- [X] a", &model).unwrap();
        assert!(!transition.changes_type());
    }

    #[test]
    fn ignores_unchanged_or_non_task_lines() {
        let model = StatusModel::default();
        let unchanged = detect_status_transition("- [x] a", "- [x] b", &model);
        assert!(unchanged.is_none());
        assert!(detect_status_transition("a", "- [x] a", &model).is_none());
        assert!(detect_status_transition("- [x] a", "- a", &model).is_none());
    }
}
