//! Reference-counted registry of per-task control state

use std::collections::HashMap;
use std::path::PathBuf;

/// Identity of a task within a workspace
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
}

impl TaskKey {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

struct Entry<T> {
    value: T,
    refs: usize,
}

/// Shared control instances keyed by task identity
///
/// Every [`acquire`](Self::acquire) must be paired with a
/// [`release`](Self::release); the instance is dropped with its last
/// reference.
pub struct ControlRegistry<T> {
    entries: HashMap<TaskKey, Entry<T>>,
}

impl<T> Default for ControlRegistry<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ControlRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance for `key`, creating it with `factory` on first use
    pub fn acquire(&mut self, key: TaskKey, factory: impl FnOnce() -> T) -> &mut T {
        let entry = self.entries.entry(key).or_insert_with(|| Entry {
            value: factory(),
            refs: 0,
        });
        entry.refs += 1;
        &mut entry.value
    }

    /// Drops one reference; returns the instance once nothing holds it
    pub fn release(&mut self, key: &TaskKey) -> Option<T> {
        let entry = self.entries.get_mut(key)?;
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs > 0 {
            return None;
        }
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn get(&self, key: &TaskKey) -> Option<&T> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Number of live references to `key`
    pub fn ref_count(&self, key: &TaskKey) -> usize {
        self.entries.get(key).map(|e| e.refs).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every instance regardless of references
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
