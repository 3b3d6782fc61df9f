//! Status model
//!
//! Immutable configuration describing status names, their marker characters,
//! the cycles a marker advances through and the coarse status types that
//! lifecycle dates key off.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Status '{0}' has no marker")]
    MissingMark(String),

    #[error("Marker {mark:?} for status '{status}' cannot appear inside a checkbox")]
    InvalidMark { status: String, mark: char },

    #[error("Cycle '{cycle}' references unknown status '{status}'")]
    UnknownStatus { cycle: String, status: String },

    #[error("Cycle '{cycle}' uses marker {mark:?} more than once")]
    DuplicateMark { cycle: String, mark: char },
}

/// Coarse classification of a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusType {
    Completed,
    InProgress,
    Abandoned,
    Planned,
    NotStarted,
    Unknown,
}

impl StatusType {
    pub fn label(&self) -> &'static str {
        match self {
            StatusType::Completed => "completed",
            StatusType::InProgress => "inProgress",
            StatusType::Abandoned => "abandoned",
            StatusType::Planned => "planned",
            StatusType::NotStarted => "notStarted",
            StatusType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Markers belonging to each status type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StatusTypeMarks {
    pub completed: Vec<char>,
    pub in_progress: Vec<char>,
    pub abandoned: Vec<char>,
    pub planned: Vec<char>,
    pub not_started: Vec<char>,
}

impl Default for StatusTypeMarks {
    fn default() -> Self {
        Self {
            completed: vec!['x', 'X'],
            in_progress: vec!['/', '>'],
            abandoned: vec!['-'],
            planned: vec!['?'],
            not_started: vec![' '],
        }
    }
}

impl StatusTypeMarks {
    /// Classifies a marker; the first type listing it wins
    pub fn type_of(&self, mark: char) -> StatusType {
        let table = [
            (&self.completed, StatusType::Completed),
            (&self.in_progress, StatusType::InProgress),
            (&self.abandoned, StatusType::Abandoned),
            (&self.planned, StatusType::Planned),
            (&self.not_started, StatusType::NotStarted),
        ];

        table
            .into_iter()
            .find(|(marks, _)| marks.contains(&mark))
            .map(|(_, status_type)| status_type)
            .unwrap_or(StatusType::Unknown)
    }

    fn all(&self) -> impl Iterator<Item = char> + '_ {
        self.completed
            .iter()
            .chain(&self.in_progress)
            .chain(&self.abandoned)
            .chain(&self.planned)
            .chain(&self.not_started)
            .copied()
    }
}

/// One position in a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStep {
    pub status: String,
    pub mark: char,
}

impl CycleStep {
    pub fn new(status: impl Into<String>, mark: char) -> Self {
        Self {
            status: status.into(),
            mark,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// An independent cycling scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCycle {
    pub name: String,

    /// Lower values take precedence
    #[serde(default)]
    pub priority: u32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Statuses in the order the cycle advances through them
    pub steps: Vec<CycleStep>,
}

impl StatusCycle {
    pub fn new(name: impl Into<String>, priority: u32, steps: Vec<CycleStep>) -> Self {
        Self {
            name: name.into(),
            priority,
            enabled: true,
            steps,
        }
    }

    pub fn contains(&self, mark: char) -> bool {
        self.position(mark).is_some()
    }

    /// Index of the step using `mark`
    pub fn position(&self, mark: char) -> Option<usize> {
        self.steps.iter().position(|step| step.mark == mark)
    }
}

/// Status names, markers, cycles and exclusions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusModel {
    /// Ordered status names; the order is the single-cycle sequence
    pub statuses: Vec<String>,

    /// Marker character per status name
    pub marks: BTreeMap<String, char>,

    /// Statuses skipped when auto-advancing
    pub excluded_from_cycle: BTreeSet<String>,

    /// Explicit cycles; empty means the single cycle over `statuses`
    pub cycles: Vec<StatusCycle>,

    /// Marker sets per status type
    pub status_types: StatusTypeMarks,
}

impl Default for StatusModel {
    fn default() -> Self {
        let statuses = [
            ("Not Started", ' '),
            ("In Progress", '/'),
            ("Abandoned", '-'),
            ("Planned", '?'),
            ("Completed", 'x'),
        ];

        Self {
            statuses: statuses
                .iter()
                .map(|(name, _)| name.to_string())
                .collect(),
            marks: statuses
                .iter()
                .map(|(name, mark)| (name.to_string(), *mark))
                .collect(),
            excluded_from_cycle: ["Abandoned", "Planned"]
                .into_iter()
                .map(String::from)
                .collect(),
            cycles: Vec::new(),
            status_types: StatusTypeMarks::default(),
        }
    }
}

impl StatusModel {
    /// Marker configured for a status
    pub fn mark_of(&self, status: &str) -> Option<char> {
        self.marks.get(status).copied()
    }

    /// First status (in declaration order) using `mark`
    pub fn status_for_mark(&self, mark: char) -> Option<&str> {
        self.statuses
            .iter()
            .find(|name| self.mark_of(name) == Some(mark))
            .map(String::as_str)
    }

    /// Status type of a marker
    pub fn type_of(&self, mark: char) -> StatusType {
        self.status_types.type_of(mark)
    }

    /// Every marker the model knows about
    pub fn alphabet(&self) -> BTreeSet<char> {
        let cycle_marks = self
            .cycles
            .iter()
            .flat_map(|c| c.steps.iter().map(|s| s.mark));
        self.marks
            .values()
            .copied()
            .chain(cycle_marks)
            .chain(self.status_types.all())
            .collect()
    }

    pub fn is_known_mark(&self, mark: char) -> bool {
        self.alphabet().contains(&mark)
    }

    /// Statuses taking part in auto-advancing, in order, with their marks
    pub fn remaining_cycle(&self) -> Vec<CycleStep> {
        self.statuses
            .iter()
            .filter(|name| !self.excluded_from_cycle.contains(*name))
            .filter_map(|name| {
                let mark = self.mark_of(name)?;
                Some(CycleStep::new(name.clone(), mark))
            })
            .collect()
    }

    /// Enabled cycles ordered by priority (stable for equal priorities)
    pub fn cycles_by_priority(&self) -> Vec<&StatusCycle> {
        let mut cycles: Vec<_> = self.cycles.iter().filter(|c| c.enabled).collect();
        cycles.sort_by_key(|c| c.priority);
        cycles
    }

    /// Checks marker uniqueness and cycle references
    pub fn validate(&self) -> Result<(), ModelError> {
        for status in &self.statuses {
            if self.mark_of(status).is_none() {
                return Err(ModelError::MissingMark(status.clone()));
            }
        }

        for (status, mark) in &self.marks {
            if *mark == '\n' || *mark == '[' || *mark == ']' {
                return Err(ModelError::InvalidMark {
                    status: status.clone(),
                    mark: *mark,
                });
            }
        }

        for cycle in &self.cycles {
            let mut seen = BTreeSet::new();
            for step in &cycle.steps {
                if !self.marks.contains_key(&step.status) {
                    return Err(ModelError::UnknownStatus {
                        cycle: cycle.name.clone(),
                        status: step.status.clone(),
                    });
                }
                if !seen.insert(step.mark) {
                    return Err(ModelError::DuplicateMark {
                        cycle: cycle.name.clone(),
                        mark: step.mark,
                    });
                }
            }
        }

        let mut seen = BTreeSet::new();
        for step in self.remaining_cycle() {
            if !seen.insert(step.mark) {
                return Err(ModelError::DuplicateMark {
                    cycle: "default".to_string(),
                    mark: step.mark,
                });
            }
        }

        Ok(())
    }
}
