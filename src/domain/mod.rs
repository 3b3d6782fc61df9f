//! Domain models for statusflow
//!
//! Pure status logic: the status model, task line classification, cycle
//! resolution and lifecycle date planning. No I/O.

mod cycle;
mod dates;
mod line;
mod status;
mod transition;

pub use cycle::{active_cycle, next_status, NextStatus};
pub use dates::{
    apply_line_edits, insertion_offset, plan_date_operations, plan_line_edits, DateError,
    DateMatcher, DateOperation, DateSettings, DateStamp, LifecycleDate, MetadataFormat,
};
pub use line::{
    classify, is_task_line, task_prefix_marker, Bullet, LineClassifier, TaskLine, DATE_EMOJIS,
};
pub use status::{CycleStep, ModelError, StatusCycle, StatusModel, StatusType, StatusTypeMarks};
pub use transition::{detect_status_transition, StatusTransition};
