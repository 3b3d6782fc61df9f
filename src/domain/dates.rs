//! Lifecycle dates
//!
//! Start, completion and cancellation stamps tied to status type
//! transitions. Dates are written either as emoji markers
//! (`✅ 2024-01-01`) or as bracketed fields (`[completion:: 2024-01-01]`);
//! both forms are recognized when reading a line.

use std::ops::Range;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::line::TaskLine;
use super::status::StatusType;
use crate::editor::{ChangeSet, ChangeSpec, Text};

const ISO_DATE: &str = r"\d{4}-\d{2}-\d{2}(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?";

#[derive(Debug, Error)]
pub enum DateError {
    #[error("Invalid date format '{0}'")]
    Format(String),

    #[error("Invalid {kind} date marker: {source}")]
    Pattern {
        kind: LifecycleDate,
        #[source]
        source: regex::Error,
    },
}

/// The three managed dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleDate {
    Start,
    Completed,
    Cancelled,
}

impl LifecycleDate {
    pub const ALL: [LifecycleDate; 3] = [
        LifecycleDate::Start,
        LifecycleDate::Completed,
        LifecycleDate::Cancelled,
    ];

    /// The date stamped when a task enters `status_type`
    pub fn for_status_type(status_type: StatusType) -> Option<Self> {
        match status_type {
            StatusType::InProgress => Some(LifecycleDate::Start),
            StatusType::Completed => Some(LifecycleDate::Completed),
            StatusType::Abandoned => Some(LifecycleDate::Cancelled),
            StatusType::NotStarted | StatusType::Planned | StatusType::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleDate::Start => "start",
            LifecycleDate::Completed => "completed",
            LifecycleDate::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for LifecycleDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How metadata is written on a task line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataFormat {
    /// `✅ 2024-01-01`
    #[default]
    Emoji,
    /// `[completion:: 2024-01-01]`
    #[serde(alias = "dataview")]
    Bracketed,
}

/// Settings for one lifecycle date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateStamp {
    /// Stamp this date automatically
    pub manage: bool,
    /// Emoji written before the date
    pub marker: String,
    /// Field name used in the bracketed form
    pub field: String,
    /// chrono strftime format for the date
    pub format: String,
}

impl DateStamp {
    fn new(marker: &str, field: &str) -> Self {
        Self {
            manage: true,
            marker: marker.to_string(),
            field: field.to_string(),
            format: "%Y-%m-%d".to_string(),
        }
    }
}

fn default_start() -> DateStamp {
    DateStamp::new("🛫", "start")
}

fn default_completed() -> DateStamp {
    DateStamp::new("✅", "completion")
}

fn default_cancelled() -> DateStamp {
    DateStamp::new("❌", "cancelled")
}

/// Lifecycle date management settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateSettings {
    /// Metadata encoding used for new stamps
    pub format: MetadataFormat,
    pub start: DateStamp,
    pub completed: DateStamp,
    pub cancelled: DateStamp,
}

impl Default for DateSettings {
    fn default() -> Self {
        Self {
            format: MetadataFormat::default(),
            start: default_start(),
            completed: default_completed(),
            cancelled: default_cancelled(),
        }
    }
}

impl DateSettings {
    pub fn stamp(&self, kind: LifecycleDate) -> &DateStamp {
        match kind {
            LifecycleDate::Start => &self.start,
            LifecycleDate::Completed => &self.completed,
            LifecycleDate::Cancelled => &self.cancelled,
        }
    }

    pub fn manages(&self, kind: LifecycleDate) -> bool {
        self.stamp(kind).manage
    }

    /// Emoji markers of all three dates
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        LifecycleDate::ALL
            .into_iter()
            .map(move |kind| self.stamp(kind).marker.as_str())
    }

    /// Checks that every format string is a valid strftime format
    pub fn validate(&self) -> Result<(), DateError> {
        for kind in LifecycleDate::ALL {
            let format = &self.stamp(kind).format;
            let invalid = StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
            if format.is_empty() || invalid {
                return Err(DateError::Format(format.clone()));
            }
        }
        Ok(())
    }

    /// Renders the token for `kind` (without surrounding whitespace)
    pub fn render(&self, kind: LifecycleDate, now: NaiveDateTime) -> String {
        let stamp = self.stamp(kind);
        let date = now.format(&stamp.format);
        match self.format {
            MetadataFormat::Emoji => format!("{} {}", stamp.marker, date),
            MetadataFormat::Bracketed => format!("[{}:: {}]", stamp.field, date),
        }
    }
}

/// A date change derived from a status type transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOperation {
    Add {
        date_type: LifecycleDate,
        format: String,
    },
    Remove {
        date_type: LifecycleDate,
    },
}

/// Compiled patterns locating date tokens on a line
#[derive(Debug, Clone)]
pub struct DateMatcher {
    start: Regex,
    completed: Regex,
    cancelled: Regex,
}

impl DateMatcher {
    pub fn new(settings: &DateSettings) -> Result<Self, DateError> {
        let compile = |kind: LifecycleDate| {
            let stamp = settings.stamp(kind);
            let date = format!("(?:{}|{})", ISO_DATE, strftime_pattern(&stamp.format));
            let pattern = format!(
                r"\s*(?:{marker}\x{{FE0F}}?\s*{date}|\[{field}::\s*{date}\s*\])",
                marker = regex::escape(&stamp.marker),
                field = regex::escape(&stamp.field),
                date = date,
            );
            Regex::new(&pattern).map_err(|source| DateError::Pattern { kind, source })
        };

        Ok(Self {
            start: compile(LifecycleDate::Start)?,
            completed: compile(LifecycleDate::Completed)?,
            cancelled: compile(LifecycleDate::Cancelled)?,
        })
    }

    fn regex(&self, kind: LifecycleDate) -> &Regex {
        match kind {
            LifecycleDate::Start => &self.start,
            LifecycleDate::Completed => &self.completed,
            LifecycleDate::Cancelled => &self.cancelled,
        }
    }

    /// Every token of `kind` on the line, including its leading whitespace
    pub fn find(&self, line: &str, kind: LifecycleDate) -> Vec<Range<usize>> {
        self.regex(kind)
            .find_iter(line)
            .map(|m| m.range())
            .collect()
    }

    pub fn contains(&self, line: &str, kind: LifecycleDate) -> bool {
        self.regex(kind).is_match(line)
    }
}

/// Converts a strftime format into a regex matching its output
fn strftime_pattern(format: &str) -> String {
    let mut pattern = String::new();
    let mut chars = format.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            pattern.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4])));
            continue;
        }
        match chars.next() {
            Some('Y') => pattern.push_str(r"\d{4}"),
            Some('y' | 'm' | 'd' | 'H' | 'M' | 'S' | 'I') => pattern.push_str(r"\d{2}"),
            Some('e' | 'k' | 'l') => pattern.push_str(r"\s?\d{1,2}"),
            Some('j') => pattern.push_str(r"\d{3}"),
            Some('F') => pattern.push_str(r"\d{4}-\d{2}-\d{2}"),
            Some('R') => pattern.push_str(r"\d{2}:\d{2}"),
            Some('T') => pattern.push_str(r"\d{2}:\d{2}:\d{2}"),
            Some('%') => pattern.push('%'),
            Some(_) => pattern.push_str(r"[^\s\]]+"),
            None => pattern.push('%'),
        }
    }

    pattern
}

/// Decides which dates to add and remove for a status type transition.
///
/// Switching between two markers of the same type never touches dates.
pub fn plan_date_operations(
    old_type: StatusType,
    new_type: StatusType,
    line: &str,
    settings: &DateSettings,
    matcher: &DateMatcher,
) -> Vec<DateOperation> {
    if old_type == new_type {
        return Vec::new();
    }

    let mut ops = Vec::new();
    let leaving = LifecycleDate::for_status_type(old_type);
    let entering = LifecycleDate::for_status_type(new_type);

    if let Some(kind) = leaving {
        if settings.manages(kind) && matcher.contains(line, kind) && Some(kind) != entering {
            ops.push(DateOperation::Remove { date_type: kind });
        }
    }

    if let Some(kind) = entering {
        if settings.manages(kind) {
            let exists = matcher.contains(line, kind);
            match kind {
                LifecycleDate::Start if exists => {}
                LifecycleDate::Start => ops.push(DateOperation::Add {
                    date_type: kind,
                    format: settings.stamp(kind).format.clone(),
                }),
                _ => {
                    if exists {
                        ops.push(DateOperation::Remove { date_type: kind });
                    }
                    ops.push(DateOperation::Add {
                        date_type: kind,
                        format: settings.stamp(kind).format.clone(),
                    });
                }
            }
        }
    }

    ops
}

/// Offset (relative to the line) where a new token of `kind` goes.
///
/// Completion dates go at the end of the line. Start and cancellation dates
/// go at the end of the metadata region but before existing completion or
/// cancellation tokens; cancellation dates follow an existing start date.
/// The result never lands after a block reference.
pub fn insertion_offset(
    line: &str,
    task: &TaskLine,
    kind: LifecycleDate,
    matcher: &DateMatcher,
) -> usize {
    let before_terminal = || {
        [LifecycleDate::Completed, LifecycleDate::Cancelled]
            .into_iter()
            .flat_map(|k| matcher.find(line, k))
            .map(|r| r.start)
            .filter(|start| *start >= task.content.end)
            .min()
            .unwrap_or(task.metadata_end)
    };

    let offset = match kind {
        LifecycleDate::Completed => task.metadata_end,
        LifecycleDate::Start => before_terminal(),
        LifecycleDate::Cancelled => matcher
            .find(line, LifecycleDate::Start)
            .last()
            .map(|r| r.end)
            .unwrap_or_else(before_terminal),
    };

    task.clamp_insertion(offset.min(line.len()))
}

/// Turns date operations into line-relative edits.
///
/// Removals are emitted in reverse offset order.
pub fn plan_line_edits(
    line: &str,
    task: &TaskLine,
    ops: &[DateOperation],
    settings: &DateSettings,
    matcher: &DateMatcher,
    now: NaiveDateTime,
) -> Vec<ChangeSpec> {
    let mut edits = Vec::new();

    for op in ops {
        match op {
            DateOperation::Remove { date_type } => {
                for range in matcher.find(line, *date_type).into_iter().rev() {
                    edits.push(ChangeSpec::delete(range.start, range.end));
                }
            }
            DateOperation::Add { date_type, .. } => {
                let offset = insertion_offset(line, task, *date_type, matcher);
                let token = settings.render(*date_type, now);
                edits.push(ChangeSpec::insert(offset, format!(" {token}")));
            }
        }
    }

    edits
}

/// Applies line-relative edits; returns `None` if they conflict
pub fn apply_line_edits(line: &str, edits: &[ChangeSpec]) -> Option<String> {
    let text = Text::from(line);
    let changes = ChangeSet::new(edits.iter().cloned(), &text).ok()?;
    Some(changes.apply(&text).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line::classify;
    use chrono::NaiveDate;

    fn jan_first() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn transition(line: &str, old: StatusType, new: StatusType, settings: &DateSettings) -> String {
        let matcher = DateMatcher::new(settings).unwrap();
        let task = classify(line).unwrap();
        let ops = plan_date_operations(old, new, line, settings, &matcher);
        let edits = plan_line_edits(line, &task, &ops, settings, &matcher, jan_first());
        apply_line_edits(line, &edits).unwrap()
    }

    #[test]
    fn start_date_added_when_work_begins() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [/] Buy milk",
                StatusType::NotStarted,
                StatusType::InProgress,
                &settings,
            ),
            "- [/] Buy milk 🛫 2024-01-01"
        );
    }

    #[test]
    fn completion_replaces_start_date() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [x] Buy milk 🛫 2024-01-01",
                StatusType::InProgress,
                StatusType::Completed,
                &settings
            ),
            "- [x] Buy milk ✅ 2024-01-01"
        );
    }

    #[test]
    fn completion_goes_before_block_reference() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [x] Task ^blk1",
                StatusType::NotStarted,
                StatusType::Completed,
                &settings
            ),
            "- [x] Task ✅ 2024-01-01 ^blk1"
        );
    }

    #[test]
    fn bracketed_format() {
        let settings = DateSettings {
            format: MetadataFormat::Bracketed,
            ..Default::default()
        };
        let started = transition(
            "- [/] Buy milk",
            StatusType::NotStarted,
            StatusType::InProgress,
            &settings,
        );
        assert_eq!(started, "- [/] Buy milk [start:: 2024-01-01]");

        let done = transition(
            &started.replace("[/]", "[x]"),
            StatusType::InProgress,
            StatusType::Completed,
            &settings,
        );
        assert_eq!(done, "- [x] Buy milk [completion:: 2024-01-01]");
    }

    #[test]
    fn same_type_never_touches_dates() {
        let settings = DateSettings::default();
        let matcher = DateMatcher::new(&settings).unwrap();
        let ops = plan_date_operations(
            StatusType::Completed,
            StatusType::Completed,
            "- [X] a ✅ 2024-01-01",
            &settings,
            &matcher,
        );
        assert!(ops.is_empty());
    }

    #[test]
    fn reopening_removes_completion() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [ ] Task #home ✅ 2024-01-01 ^id",
                StatusType::Completed,
                StatusType::NotStarted,
                &settings
            ),
            "- [ ] Task #home ^id"
        );
    }

    #[test]
    fn duplicate_tokens_are_all_removed() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [ ] a 🛫 2024-01-01 🛫 2024-01-02 09:00",
                StatusType::InProgress,
                StatusType::NotStarted,
                &settings
            ),
            "- [ ] a"
        );
    }

    #[test]
    fn existing_start_date_is_kept() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [/] a 🛫 2023-12-01",
                StatusType::Planned,
                StatusType::InProgress,
                &settings
            ),
            "- [/] a 🛫 2023-12-01"
        );
    }

    #[test]
    fn cancellation_follows_start_date() {
        let settings = DateSettings {
            start: DateStamp {
                manage: false,
                ..default_start()
            },
            ..Default::default()
        };
        assert_eq!(
            transition(
                "- [-] a 🛫 2023-12-01 #tag",
                StatusType::InProgress,
                StatusType::Abandoned,
                &settings
            ),
            "- [-] a 🛫 2023-12-01 ❌ 2024-01-01 #tag"
        );
    }

    #[test]
    fn start_date_goes_before_stale_completion() {
        let settings = DateSettings {
            completed: DateStamp {
                manage: false,
                ..default_completed()
            },
            ..Default::default()
        };
        assert_eq!(
            transition(
                "- [/] a ✅ 2023-12-01",
                StatusType::Completed,
                StatusType::InProgress,
                &settings
            ),
            "- [/] a 🛫 2024-01-01 ✅ 2023-12-01"
        );
    }

    #[test]
    fn completion_is_restamped() {
        let settings = DateSettings::default();
        assert_eq!(
            transition(
                "- [x] a ✅ 2023-12-01",
                StatusType::Unknown,
                StatusType::Completed,
                &settings
            ),
            "- [x] a ✅ 2024-01-01"
        );
    }

    #[test]
    fn unmanaged_dates_are_ignored() {
        let mut settings = DateSettings::default();
        settings.start.manage = false;
        assert_eq!(
            transition(
                "- [/] a",
                StatusType::NotStarted,
                StatusType::InProgress,
                &settings,
            ),
            "- [/] a"
        );
    }

    #[test]
    fn custom_format_with_time() {
        let mut settings = DateSettings::default();
        settings.completed.format = "%d/%m/%Y %H:%M".to_string();
        let done = transition(
            "- [x] a",
            StatusType::NotStarted,
            StatusType::Completed,
            &settings,
        );
        assert_eq!(done, "- [x] a ✅ 01/01/2024 09:30");

        let reopened = transition(
            &done.replace("[x]", "[ ]"),
            StatusType::Completed,
            StatusType::NotStarted,
            &settings,
        );
        assert_eq!(reopened, "- [ ] a");
    }

    #[test]
    fn matcher_reads_both_encodings() {
        let settings = DateSettings::default();
        let matcher = DateMatcher::new(&settings).unwrap();
        let line = "- [x] a [completion:: 2024-01-01] ✅ 2024-01-02";
        assert_eq!(matcher.find(line, LifecycleDate::Completed).len(), 2);
        assert!(!matcher.contains(line, LifecycleDate::Start));
    }

    #[test]
    fn validate_rejects_bad_format() {
        let mut settings = DateSettings::default();
        assert!(settings.validate().is_ok());
        settings.start.format = "%Y-%".to_string();
        assert!(matches!(settings.validate(), Err(DateError::Format(_))));
    }

    #[test]
    fn status_types_map_to_dates() {
        assert_eq!(
            LifecycleDate::for_status_type(StatusType::InProgress),
            Some(LifecycleDate::Start)
        );
        assert_eq!(
            LifecycleDate::for_status_type(StatusType::Abandoned),
            Some(LifecycleDate::Cancelled)
        );
        assert_eq!(LifecycleDate::for_status_type(StatusType::Planned), None);
    }
}
