//! Task line classification
//!
//! Recognizes `- [x] text` style task lines (bullets `-`, `*`, `+` or
//! ordinals `1.` / `1)`) and splits them into marker, human content,
//! trailing metadata and an optional trailing block reference.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static TASK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([-*+]|\d+[.)])\s+\[(.)\]").expect("task prefix pattern is valid")
});

static BLOCK_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\^[A-Za-z0-9\-_]+\s*$").expect("block reference pattern is valid")
});

static FIELD_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[[^\[\]]+?::[^\[\]]*\]").expect("field token pattern is valid")
});

static DATE_AFTER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\x{FE0F}?\s*\d{4}-\d{2}-\d{2}").expect("date pattern is valid")
});

/// Emoji that introduce a date in inline metadata
pub const DATE_EMOJIS: &[&str] = &["📅", "🗓", "⏳", "🛫", "✅", "❌", "➕", "🏁"];

/// List marker preceding the checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    Dash,
    Asterisk,
    Plus,
    Ordinal,
}

/// A classified task line. All offsets are relative to the line start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    /// Length of the leading whitespace
    pub indent: usize,
    pub bullet: Bullet,
    /// Character inside the checkbox
    pub marker: char,
    /// Offset of the marker character
    pub marker_offset: usize,
    /// Human text, ending before the first metadata token
    pub content: Range<usize>,
    /// End of content plus trailing metadata, before any block reference
    pub metadata_end: usize,
    /// Trailing `^id` anchor including the whitespace before it
    pub block_ref: Option<Range<usize>>,
    /// Length of the whole line
    pub line_len: usize,
}

impl TaskLine {
    /// Offset just past the marker
    pub fn marker_end(&self) -> usize {
        self.marker_offset + self.marker.len_utf8()
    }

    /// Latest offset at which text may be inserted
    pub fn insertion_limit(&self) -> usize {
        self.block_ref
            .as_ref()
            .map(|r| r.start)
            .unwrap_or(self.line_len)
    }

    /// Clamps an insertion offset so it never lands after the block reference
    pub fn clamp_insertion(&self, offset: usize) -> usize {
        offset.min(self.insertion_limit())
    }
}

/// Classifies task lines, recognizing a configurable set of date emoji
#[derive(Debug, Clone)]
pub struct LineClassifier {
    date_markers: Vec<String>,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self {
            date_markers: DATE_EMOJIS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl LineClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds extra date markers (for example customized lifecycle glyphs)
    pub fn with_date_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for marker in markers {
            let marker = marker.into();
            if !marker.is_empty() && !self.date_markers.contains(&marker) {
                self.date_markers.push(marker);
            }
        }
        self
    }

    /// Classifies a single line (without its newline)
    pub fn classify(&self, line: &str) -> Option<TaskLine> {
        let caps = TASK_PREFIX.captures(line)?;
        let indent = caps.get(1).map(|m| m.len()).unwrap_or(0);
        let bullet = match caps.get(2).map(|m| m.as_str()) {
            Some("-") => Bullet::Dash,
            Some("*") => Bullet::Asterisk,
            Some("+") => Bullet::Plus,
            _ => Bullet::Ordinal,
        };
        let marker_match = caps.get(3)?;
        let marker = marker_match.as_str().chars().next()?;
        let marker_offset = marker_match.start();
        let prefix_end = caps.get(0)?.end();

        let content_start = if line[prefix_end..].starts_with(' ') {
            prefix_end + 1
        } else {
            prefix_end
        };

        let block_ref = BLOCK_REFERENCE
            .find(&line[content_start..])
            .map(|m| (content_start + m.start())..line.len());

        let region_end = block_ref.as_ref().map(|r| r.start).unwrap_or(line.len());
        let metadata_end = trim_end(line, content_start, region_end);

        let stop = self.find_metadata_start(line, content_start, metadata_end);
        let content_end = trim_end(line, content_start, stop);

        Some(TaskLine {
            indent,
            bullet,
            marker,
            marker_offset,
            content: content_start..content_end,
            metadata_end,
            block_ref,
            line_len: line.len(),
        })
    }

    /// Scans for the first metadata token outside `[[links]]`
    fn find_metadata_start(&self, line: &str, from: usize, to: usize) -> usize {
        let mut link_depth = 0usize;
        let mut prev: Option<char> = None;
        let mut pos = from;

        while pos < to {
            let rest = &line[pos..to];
            let Some(ch) = rest.chars().next() else {
                break;
            };

            if rest.starts_with("[[") {
                link_depth += 1;
                pos += 2;
                prev = Some('[');
                continue;
            }
            if rest.starts_with("]]") && link_depth > 0 {
                link_depth -= 1;
                pos += 2;
                prev = Some(']');
                continue;
            }

            if link_depth == 0 {
                if ch == '[' && FIELD_TOKEN.is_match(rest) {
                    return pos;
                }

                if ch == '#' && prev.map_or(true, char::is_whitespace) {
                    let next = rest[1..].chars().next();
                    if next.is_some_and(|c| !c.is_whitespace() && c != '#') {
                        return pos;
                    }
                }

                if let Some(marker) = self
                    .date_markers
                    .iter()
                    .find(|marker| rest.starts_with(marker.as_str()))
                {
                    if DATE_AFTER_MARKER.is_match(&rest[marker.len()..]) {
                        return pos;
                    }
                }
            }

            prev = Some(ch);
            pos += ch.len_utf8();
        }

        to
    }
}

/// Classifies a line with the default date markers
pub fn classify(line: &str) -> Option<TaskLine> {
    LineClassifier::default().classify(line)
}

/// Returns true if the line starts with a task checkbox
pub fn is_task_line(line: &str) -> bool {
    TASK_PREFIX.is_match(line)
}

/// Offset of the task prefix's marker within `text`, if `text` starts with one
pub fn task_prefix_marker(text: &str) -> Option<(usize, char)> {
    let caps = TASK_PREFIX.captures(text)?;
    let marker = caps.get(3)?;
    Some((marker.start(), marker.as_str().chars().next()?))
}

fn trim_end(line: &str, floor: usize, end: usize) -> usize {
    let trimmed = line[floor..end].trim_end();
    floor + trimmed.len()
}
