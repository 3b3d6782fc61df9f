//! Markdown documents on disk
//!
//! Documents are read whole and written back atomically (temp file +
//! rename) while holding an exclusive lock on the target.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use thiserror::Error;

use crate::editor::Text;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(PathBuf),

    #[error("Document is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),
}

/// A markdown file holding task lines
pub struct MarkdownFile {
    path: PathBuf,
}

impl MarkdownFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document
    pub fn read(&self) -> Result<Text> {
        if !self.path.exists() {
            return Err(DocumentError::NotFound(self.path.clone()).into());
        }

        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open document: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on document")?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read document: {}", self.path.display()))?;

        let content =
            String::from_utf8(bytes).map_err(|_| DocumentError::NotUtf8(self.path.clone()))?;

        // Lock is released when file is dropped
        Ok(Text::new(content))
    }

    /// Replaces the document contents
    pub fn write(&self, text: &Text) -> Result<()> {
        let target = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("Failed to open document: {}", self.path.display()))?;

        target.lock_exclusive()
            .context("Failed to acquire write lock on document")?;

        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            let mut writer = BufWriter::new(&file);
            writer.write_all(text.as_str().as_bytes())
                .context("Failed to write document")?;
            writer.flush().context("Failed to flush document")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let file = MarkdownFile::new(dir.path().join("tasks.md"));

        file.write(&Text::from("- [ ] a\n- [x] b ✅ 2024-01-01\n")).unwrap();
        let text = file.read().unwrap();

        assert_eq!(text.as_str(), "- [ ] a\n- [x] b ✅ 2024-01-01\n");
        assert!(!dir.path().join("tasks.md.tmp").exists());
    }

    #[test]
    fn overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let file = MarkdownFile::new(dir.path().join("tasks.md"));

        file.write(&Text::from("a much longer original document")).unwrap();
        file.write(&Text::from("short")).unwrap();

        assert_eq!(file.read().unwrap().as_str(), "short");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let file = MarkdownFile::new(dir.path().join("missing.md"));

        let err = file.read().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocumentError>(),
            Some(DocumentError::NotFound(_))
        ));
    }
}
