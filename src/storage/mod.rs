//! # Storage Layer
//!
//! Settings files and the markdown documents the pipeline edits.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project settings | TOML | `.statusflow/config.toml` |
//! | Global settings | TOML | platform config dir |
//! | Documents | Markdown | anywhere |
//!
//! ## Concurrency Safety
//!
//! - [`MarkdownFile`] takes an `fs2` lock while reading or writing
//! - Writes are atomic (temp file + rename)

mod config;
mod document;

pub use config::{Config, ConfigError, OutputFormat, Settings, PROJECT_DIR};
pub use document::{DocumentError, MarkdownFile};
