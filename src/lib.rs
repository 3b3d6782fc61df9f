//! statusflow - a task-status transaction pipeline
//!
//! Intercepts edits to markdown task lists, recognizes deliberate changes to
//! a task's checkbox marker, advances it through configurable status cycles
//! and keeps start, completion and cancellation dates in step with the
//! status.

pub mod cli;
pub mod control;
pub mod domain;
pub mod editor;
pub mod pipeline;
pub mod storage;

pub use domain::{next_status, DateSettings, NextStatus, StatusModel, StatusType};
pub use editor::{ChangeSpec, Text, Transaction};
pub use pipeline::{FixedClock, StatusPipeline};
