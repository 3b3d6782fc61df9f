//! Cycle resolution
//!
//! Given the marker currently in a checkbox, picks the status it advances
//! to. Explicit cycles are searched by priority; without them the single
//! cycle over the model's non-excluded statuses applies.

use serde::Serialize;

use super::status::{CycleStep, StatusCycle, StatusModel};

/// The status a marker advances to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextStatus {
    pub status_name: String,
    pub mark: char,
}

impl From<&CycleStep> for NextStatus {
    fn from(step: &CycleStep) -> Self {
        Self {
            status_name: step.status.clone(),
            mark: step.mark,
        }
    }
}

/// The highest-priority enabled cycle containing `mark`
pub fn active_cycle(mark: char, model: &StatusModel) -> Option<&StatusCycle> {
    model
        .cycles_by_priority()
        .into_iter()
        .find(|cycle| cycle.contains(mark))
}

/// Resolves the status that follows `current`.
///
/// Returns `None` only when every status is excluded from cycling.
pub fn next_status(current: char, model: &StatusModel) -> Option<NextStatus> {
    let remaining = model.remaining_cycle();
    let first = remaining.first()?;

    if !model.cycles.is_empty() {
        return Some(match active_cycle(current, model) {
            Some(cycle) => {
                // position() is Some because active_cycle matched on it
                let idx = cycle.position(current).unwrap_or(0);
                NextStatus::from(&cycle.steps[(idx + 1) % cycle.steps.len()])
            }
            None => NextStatus::from(first),
        });
    }

    let idx = remaining
        .iter()
        .position(|step| step.mark == current)
        .unwrap_or(0);
    Some(NextStatus::from(&remaining[(idx + 1) % remaining.len()]))
}
