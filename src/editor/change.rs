//! Change sets and position mapping
//!
//! A [`ChangeSet`] is a validated list of edits expressed against a single
//! starting document. Every change keeps its coordinates in both the old
//! document (`from_a..to_a`) and the new document (`from_b..to_b`), which is
//! what [`PositionMap`] uses to translate offsets in either direction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::text::Text;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Change {from}..{to} has its end before its start")]
    Inverted { from: usize, to: usize },

    #[error("Change {from}..{to} is outside the document (length {len})")]
    OutOfBounds { from: usize, to: usize, len: usize },

    #[error("Changes {first:?} and {second:?} overlap")]
    Overlap {
        first: (usize, usize),
        second: (usize, usize),
    },

    #[error("Offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// A single requested edit: replace `from..to` with `insert`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSpec {
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub insert: String,
}

impl ChangeSpec {
    pub fn replace(from: usize, to: usize, insert: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: insert.into(),
        }
    }

    pub fn insert(at: usize, insert: impl Into<String>) -> Self {
        Self::replace(at, at, insert)
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self::replace(from, to, String::new())
    }

    /// Returns the same edit moved by `offset` bytes
    pub fn shifted(&self, offset: usize) -> Self {
        Self::replace(self.from + offset, self.to + offset, self.insert.clone())
    }

    /// Returns true if this edit changes nothing
    pub fn is_noop(&self) -> bool {
        self.from == self.to && self.insert.is_empty()
    }
}

/// A validated change with coordinates in both documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from_a: usize,
    pub to_a: usize,
    pub from_b: usize,
    pub to_b: usize,
    pub insert: String,
}

impl Change {
    /// Returns true if this change removes text from the old document
    pub fn deletes(&self) -> bool {
        self.to_a > self.from_a
    }

    /// Returns true if this change inserts text
    pub fn inserts(&self) -> bool {
        !self.insert.is_empty()
    }

    /// Returns the change as a spec against the old document
    pub fn to_spec(&self) -> ChangeSpec {
        ChangeSpec::replace(self.from_a, self.to_a, self.insert.clone())
    }
}

/// An ordered, non-overlapping set of changes against one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Validates and orders the given specs against `doc`.
    ///
    /// Insertions at the same offset keep the order they were given in.
    /// No-op specs are discarded.
    pub fn new(specs: impl IntoIterator<Item = ChangeSpec>, doc: &Text) -> Result<Self, EditError> {
        let mut specs: Vec<ChangeSpec> = specs.into_iter().filter(|s| !s.is_noop()).collect();

        for spec in &specs {
            if spec.from > spec.to {
                return Err(EditError::Inverted {
                    from: spec.from,
                    to: spec.to,
                });
            }
            if spec.to > doc.len() {
                return Err(EditError::OutOfBounds {
                    from: spec.from,
                    to: spec.to,
                    len: doc.len(),
                });
            }
            for pos in [spec.from, spec.to] {
                if !doc.is_boundary(pos) {
                    return Err(EditError::NotCharBoundary(pos));
                }
            }
        }

        // Stable sort keeps same-position insertions in caller order
        specs.sort_by_key(|s| (s.from, s.to));

        for pair in specs.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if second.from < first.to {
                return Err(EditError::Overlap {
                    first: (first.from, first.to),
                    second: (second.from, second.to),
                });
            }
        }

        let mut delta: isize = 0;
        let changes = specs
            .into_iter()
            .map(|spec| {
                let from_b = (spec.from as isize + delta) as usize;
                let to_b = from_b + spec.insert.len();
                delta += spec.insert.len() as isize - (spec.to - spec.from) as isize;
                Change {
                    from_a: spec.from,
                    to_a: spec.to,
                    from_b,
                    to_b,
                    insert: spec.insert,
                }
            })
            .collect();

        Ok(Self { changes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Iterates over the changes in document order
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }

    /// Returns the changes as specs against the old document
    pub fn specs(&self) -> Vec<ChangeSpec> {
        self.changes.iter().map(Change::to_spec).collect()
    }

    /// Applies the changes to the document they were validated against
    pub fn apply(&self, doc: &Text) -> Text {
        let source = doc.as_str();
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;

        for change in &self.changes {
            out.push_str(&source[cursor..change.from_a]);
            out.push_str(&change.insert);
            cursor = change.to_a;
        }
        out.push_str(&source[cursor..]);

        Text::new(out)
    }

    /// Builds the position map for these changes
    pub fn position_map(&self) -> PositionMap {
        PositionMap {
            spans: self
                .changes
                .iter()
                .map(|c| Span {
                    from_a: c.from_a,
                    to_a: c.to_a,
                    from_b: c.from_b,
                    to_b: c.to_b,
                })
                .collect(),
        }
    }
}

/// Which side of an edit a position sticks to when the edit touches it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Stay before text inserted at the position
    Before,
    /// Move after text inserted at the position
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    from_a: usize,
    to_a: usize,
    from_b: usize,
    to_b: usize,
}

impl Span {
    fn reversed(self) -> Self {
        Self {
            from_a: self.from_b,
            to_a: self.to_b,
            from_b: self.from_a,
            to_b: self.to_a,
        }
    }
}

/// Maps offsets between the old and new documents of a change set.
///
/// Positions inside a replaced range collapse to its start (`Bias::Before`)
/// or its end (`Bias::After`). The exact start and end of a replaced range
/// always map to the start and end of its replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    spans: Vec<Span>,
}

impl PositionMap {
    /// Maps an old-document offset into the new document
    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        map_through(self.spans.iter().copied(), pos, bias)
    }

    /// Maps a new-document offset back into the old document
    pub fn map_back(&self, pos: usize, bias: Bias) -> usize {
        map_through(self.spans.iter().map(|s| s.reversed()), pos, bias)
    }

    pub fn is_identity(&self) -> bool {
        self.spans.is_empty()
    }
}

fn map_through(spans: impl Iterator<Item = Span>, pos: usize, bias: Bias) -> usize {
    let mut delta: isize = 0;

    for span in spans {
        if pos < span.from_a {
            break;
        }
        if pos > span.to_a {
            delta = span.to_b as isize - span.to_a as isize;
            continue;
        }

        // from_a <= pos <= to_a
        if span.from_a == span.to_a {
            match bias {
                Bias::Before => return span.from_b,
                Bias::After => {
                    delta = span.to_b as isize - span.to_a as isize;
                    continue;
                }
            }
        }
        if pos == span.to_a {
            // Later insertions at this offset may still apply
            delta = span.to_b as isize - span.to_a as isize;
            continue;
        }
        if pos == span.from_a {
            return span.from_b;
        }
        return match bias {
            Bias::Before => span.from_b,
            Bias::After => span.to_b,
        };
    }

    (pos as isize + delta) as usize
}
