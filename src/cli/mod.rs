//! # Command-Line Interface
//!
//! A harness that drives the status pipeline against markdown files.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `init` | Write default settings |
//! | `next`, `statuses`, `menu` | Inspect the status model |
//! | `cycle`, `set` | Click or set a task's checkbox |
//! | `replay` | Apply a recorded transaction |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Logging
//!
//! Use `--verbose` (or `-v`) for debug logs on stderr, or set `RUST_LOG`:
//! ```bash
//! RUST_LOG=statusflow=trace statusflow cycle notes.md 3
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod edit_cmd;
mod output;
mod status_cmd;

pub use app::{run, Cli, Commands, Session};
pub use output::{Output, OutputFormat};
