// Snapshot-based undo/redo

use crate::models::Task;
use crate::record;
use serde_json::Value;
use std::collections::VecDeque;
use tracing::debug;

/// Serialized copy of the whole collection at one instant.
///
/// Holds encoded records rather than `Task` values, so nothing done to the
/// live collection afterwards can reach into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Vec<Value>,
}

impl Snapshot {
    pub fn capture(tasks: &[Task]) -> Self {
        Self {
            records: record::serialize_all(tasks),
        }
    }

    /// Decode the stored records back into tasks
    pub fn restore(&self) -> Vec<Task> {
        self.records
            .iter()
            .filter_map(|value| record::deserialize(value).ok())
            .map(|decoded| decoded.task)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Undo and redo stacks of whole-collection snapshots
#[derive(Debug, Default)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    /// Maximum depth of each stack; the oldest entries are dropped first
    limit: Option<usize>,
}

impl History {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Save the pre-mutation state. Any redo lineage is discarded.
    pub fn record_before_mutation(&mut self, current: Snapshot) {
        Self::push_bounded(&mut self.undo_stack, current, self.limit);
        self.redo_stack.clear();
        debug!(undo_depth = self.undo_stack.len(), "Recorded snapshot");
    }

    /// Step back. Returns the snapshot to restore, or `None` if there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop_back()?;
        Self::push_bounded(&mut self.redo_stack, current, self.limit);
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop_back()?;
        Self::push_bounded(&mut self.undo_stack, current, self.limit);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, limit: Option<usize>) {
        stack.push_back(snapshot);
        if let Some(limit) = limit {
            while stack.len() > limit {
                stack.pop_front();
            }
        }
    }
}
