// Ordered task collection with undo history and file persistence

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::history::{History, Snapshot};
use crate::models::{Priority, Task, clean_tags, renormalize};
use crate::storage;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Store tuning knobs
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Cap on undo/redo depth; `None` keeps the whole session
    pub history_limit: Option<usize>,
    /// Pretty-print the state file
    pub pretty: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            history_limit: None,
            pretty: true,
        }
    }
}

/// Field changes for [`TaskStore::edit`]. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub text: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

impl TaskEdit {
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// The task list.
///
/// Tasks are kept in canonical order with a dense `order_index`. Every
/// mutation snapshots the previous state for undo, then rewrites the state
/// file. If that write fails the error is returned but the in-memory change
/// stands, so the collection stays consistent either way.
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    history: History,
    pub(crate) pretty: bool,
}

impl TaskStore {
    /// Open the store backed by the state file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::open_with(path, StoreOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        let tasks = storage::load_tasks(&path);

        Self {
            path,
            tasks,
            history: History::new(options.history_limit),
            pretty: options.pretty,
        }
    }

    /// Get the path of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All tasks in canonical order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task at the end of the list. Returns its id.
    pub fn add(&mut self, text: &str, priority: Priority, due_date: &str, tags: Vec<String>) -> Result<i64> {
        Self::validate_text(text)?;

        self.checkpoint();
        let task = Task::new(text, priority, due_date, tags, self.tasks.len() as i64);
        let id = task.id;
        debug!(id, text = %task.text, "Adding task");
        self.tasks.push(task);

        self.commit()?;
        Ok(id)
    }

    /// Apply `changes` to task `id`.
    ///
    /// Returns `Ok(false)` if no such task exists. Empty replacement text is
    /// rejected before anything is touched.
    pub fn edit(&mut self, id: i64, changes: TaskEdit) -> Result<bool> {
        if let Some(text) = &changes.text {
            Self::validate_text(text)?;
        }

        let Some(idx) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "Edit target not found");
            return Ok(false);
        };

        self.checkpoint();
        let task = &mut self.tasks[idx];
        if let Some(text) = changes.text {
            task.text = text.trim().to_string();
        }
        if let Some(due_date) = changes.due_date {
            task.due_date = due_date.trim().to_string();
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if let Some(tags) = changes.tags {
            task.tags = clean_tags(tags);
        }
        debug!(id, "Edited task");

        self.commit()?;
        Ok(true)
    }

    /// Flip `completed` on every listed task. Returns how many were flipped.
    pub fn toggle<I: IntoIterator<Item = i64>>(&mut self, ids: I) -> Result<usize> {
        let ids: HashSet<i64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        self.checkpoint();
        let mut count = 0;
        for task in self.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
            task.completed = !task.completed;
            count += 1;
        }
        debug!(requested = ids.len(), count, "Toggled tasks");

        self.commit()?;
        Ok(count)
    }

    /// Remove every listed task. Returns how many were removed.
    pub fn delete<I: IntoIterator<Item = i64>>(&mut self, ids: I) -> Result<usize> {
        let ids: HashSet<i64> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        self.checkpoint();
        let before = self.tasks.len();
        self.tasks.retain(|t| !ids.contains(&t.id));
        let count = before - self.tasks.len();
        debug!(requested = ids.len(), count, "Deleted tasks");

        self.commit()?;
        Ok(count)
    }

    /// Put the listed ids first, in the given order. Unlisted tasks follow,
    /// keeping their relative order. Unknown and repeated ids are ignored.
    pub fn reorder(&mut self, ordered_ids: &[i64]) -> Result<()> {
        if ordered_ids.is_empty() {
            return Ok(());
        }

        let mut position: HashMap<i64, usize> = HashMap::new();
        for &id in ordered_ids {
            if self.get(id).is_some() && !position.contains_key(&id) {
                position.insert(id, position.len());
            }
        }
        if position.is_empty() {
            return Ok(());
        }

        self.checkpoint();
        let listed = position.len();
        let mut keyed: Vec<(usize, Task)> = self
            .tasks
            .drain(..)
            .enumerate()
            .map(|(current, task)| {
                let key = position.get(&task.id).copied().unwrap_or(listed + current);
                (key, task)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);

        self.tasks = keyed
            .into_iter()
            .enumerate()
            .map(|(idx, (_, mut task))| {
                task.order_index = idx as i64;
                task
            })
            .collect();
        debug!(listed, total = self.tasks.len(), "Reordered tasks");

        self.commit()
    }

    /// Discard the collection and substitute `tasks`
    pub fn replace_all(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.checkpoint();
        info!(previous = self.tasks.len(), count = tasks.len(), "Replacing all tasks");
        self.tasks = tasks;
        self.commit()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Tasks passing `filter`, in canonical order
    pub fn filter(&self, filter: &Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Restore the state before the last mutation. Returns `false` if there was none.
    pub fn undo(&mut self) -> Result<bool> {
        let Some(previous) = self.history.undo(Snapshot::capture(&self.tasks)) else {
            return Ok(false);
        };
        self.tasks = previous.restore();
        debug!(count = self.tasks.len(), "Undo");
        self.commit()?;
        Ok(true)
    }

    /// Re-apply the last undone mutation. Returns `false` if there was none.
    pub fn redo(&mut self) -> Result<bool> {
        let Some(next) = self.history.redo(Snapshot::capture(&self.tasks)) else {
            return Ok(false);
        };
        self.tasks = next.restore();
        debug!(count = self.tasks.len(), "Redo");
        self.commit()?;
        Ok(true)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the current collection to the state file
    pub fn save(&self) -> Result<()> {
        storage::write_tasks(&self.path, &self.tasks, self.pretty)
    }

    fn checkpoint(&mut self) {
        self.history.record_before_mutation(Snapshot::capture(&self.tasks));
    }

    fn commit(&mut self) -> Result<()> {
        renormalize(&mut self.tasks);
        self.save()
    }

    fn validate_text(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::Validation("task text cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{PriorityFilter, StatusFilter};
    use std::fs;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, TaskStore) {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::open(temp.path().join("tasks.json"));
        (temp, store)
    }

    fn add(store: &mut TaskStore, text: &str) -> i64 {
        store.add(text, Priority::Medium, "", Vec::new()).unwrap()
    }

    fn texts(store: &TaskStore) -> Vec<&str> {
        store.tasks().iter().map(|t| t.text.as_str()).collect()
    }

    fn assert_dense(store: &TaskStore) {
        let indexes: Vec<i64> = store.tasks().iter().map(|t| t.order_index).collect();
        let expected: Vec<i64> = (0..store.len() as i64).collect();
        assert_eq!(indexes, expected);
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_temp, store) = open_temp();
        assert!(store.is_empty());
        assert!(!store.can_undo());
    }

    #[test]
    fn test_add_toggle_undo_redo_scenario() {
        let (_temp, mut store) = open_temp();

        let id = add(&mut store, "Buy milk");
        assert_eq!(store.len(), 1);
        let task = store.get(id).unwrap();
        assert_eq!(task.order_index, 0);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.tags.is_empty());

        assert_eq!(store.toggle([id]).unwrap(), 1);
        assert!(store.get(id).unwrap().completed);

        assert!(store.undo().unwrap());
        assert!(!store.get(id).unwrap().completed);

        assert!(store.redo().unwrap());
        assert!(store.get(id).unwrap().completed);
    }

    #[test]
    fn test_add_blank_text_is_rejected() {
        let (temp, mut store) = open_temp();

        let err = store.add("   ", Priority::High, "", Vec::new()).unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());
        assert!(!store.can_undo());
        assert!(!temp.path().join("tasks.json").exists());
    }

    #[test]
    fn test_add_persists() {
        let (temp, mut store) = open_temp();
        add(&mut store, "first");
        add(&mut store, "second");

        let reopened = TaskStore::open(temp.path().join("tasks.json"));
        assert_eq!(reopened.tasks(), store.tasks());
    }

    #[test]
    fn test_edit_changes_only_given_fields() {
        let (_temp, mut store) = open_temp();
        let id = store
            .add("Write report", Priority::Low, "2025-01-01", vec!["work".to_string()])
            .unwrap();

        let changed = store
            .edit(id, TaskEdit::default().priority(Priority::High).due_date(" 2025-02-01 "))
            .unwrap();
        assert!(changed);

        let task = store.get(id).unwrap();
        assert_eq!(task.text, "Write report");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, "2025-02-01");
        assert_eq!(task.tags, vec!["work"]);

        store
            .edit(id, TaskEdit::default().text("  Final report ").tags(vec![" a ".into(), "".into()]))
            .unwrap();
        let task = store.get(id).unwrap();
        assert_eq!(task.text, "Final report");
        assert_eq!(task.tags, vec!["a"]);
    }

    #[test]
    fn test_edit_blank_text_applies_nothing() {
        let (_temp, mut store) = open_temp();
        let id = add(&mut store, "keep me");
        let depth_before = store.history.undo_depth();

        let err = store
            .edit(id, TaskEdit::default().text("  ").priority(Priority::High))
            .unwrap_err();
        assert!(err.is_validation());

        let task = store.get(id).unwrap();
        assert_eq!(task.text, "keep me");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(store.history.undo_depth(), depth_before);
    }

    #[test]
    fn test_edit_unknown_id() {
        let (_temp, mut store) = open_temp();
        add(&mut store, "a");
        let depth_before = store.history.undo_depth();

        assert!(!store.edit(-1, TaskEdit::default().text("b")).unwrap());
        assert_eq!(store.history.undo_depth(), depth_before);
    }

    #[test]
    fn test_empty_sets_are_noops() {
        let (_temp, mut store) = open_temp();
        add(&mut store, "a");
        let depth_before = store.history.undo_depth();

        assert_eq!(store.toggle(Vec::new()).unwrap(), 0);
        assert_eq!(store.delete(Vec::new()).unwrap(), 0);
        store.reorder(&[]).unwrap();
        store.reorder(&[424242, 424243]).unwrap();
        assert_eq!(store.history.undo_depth(), depth_before);
        assert_eq!(texts(&store), vec!["a"]);
    }

    #[test]
    fn test_delete_renormalizes() {
        let (_temp, mut store) = open_temp();
        let a = add(&mut store, "a");
        add(&mut store, "b");
        let c = add(&mut store, "c");
        add(&mut store, "d");

        assert_eq!(store.delete([a, c]).unwrap(), 2);
        assert_eq!(texts(&store), vec!["b", "d"]);
        assert_dense(&store);
    }

    #[test]
    fn test_reorder_full_and_partial() {
        let (_temp, mut store) = open_temp();
        let a = add(&mut store, "a");
        let b = add(&mut store, "b");
        let c = add(&mut store, "c");
        let d = add(&mut store, "d");

        store.reorder(&[d, c, b, a]).unwrap();
        assert_eq!(texts(&store), vec!["d", "c", "b", "a"]);
        assert_dense(&store);

        // Only the listed ids move to the front; the rest keep their relative order
        store.reorder(&[b, 999, b, d]).unwrap();
        assert_eq!(texts(&store), vec!["b", "d", "c", "a"]);
        assert_dense(&store);
    }

    #[test]
    fn test_order_stays_dense_through_mixed_operations() {
        let (_temp, mut store) = open_temp();
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(add(&mut store, &format!("task {}", i)));
            assert_dense(&store);
        }

        store.toggle([ids[1], ids[4]]).unwrap();
        assert_dense(&store);
        store.delete([ids[0]]).unwrap();
        assert_dense(&store);
        store.reorder(&[ids[5], ids[2]]).unwrap();
        assert_dense(&store);
        store.edit(ids[3], TaskEdit::default().text("renamed")).unwrap();
        assert_dense(&store);
        store.undo().unwrap();
        assert_dense(&store);
        add(&mut store, "late");
        assert_dense(&store);
        store.delete([ids[5], ids[2], ids[3]]).unwrap();
        assert_dense(&store);
    }

    #[test]
    fn test_undo_restores_exact_state() {
        let (_temp, mut store) = open_temp();
        let a = add(&mut store, "a");
        add(&mut store, "b");
        store.edit(a, TaskEdit::default().tags(vec!["x".into()])).unwrap();

        let before = store.tasks().to_vec();
        store.delete([a]).unwrap();
        let after = store.tasks().to_vec();

        store.undo().unwrap();
        assert_eq!(store.tasks(), before.as_slice());
        store.redo().unwrap();
        assert_eq!(store.tasks(), after.as_slice());
    }

    #[test]
    fn test_forward_mutation_clears_redo() {
        let (_temp, mut store) = open_temp();
        add(&mut store, "a");
        store.undo().unwrap();
        assert!(store.can_redo());

        add(&mut store, "b");
        assert!(!store.can_redo());
        assert!(!store.redo().unwrap());
        assert_eq!(texts(&store), vec!["b"]);
    }

    #[test]
    fn test_undo_redo_on_empty_history() {
        let (_temp, mut store) = open_temp();
        assert!(!store.undo().unwrap());
        assert!(!store.redo().unwrap());
    }

    #[test]
    fn test_undo_is_persisted() {
        let (temp, mut store) = open_temp();
        add(&mut store, "a");
        add(&mut store, "b");
        store.undo().unwrap();

        let reopened = TaskStore::open(temp.path().join("tasks.json"));
        assert_eq!(texts(&reopened), vec!["a"]);
    }

    #[test]
    fn test_history_limit() {
        let temp = TempDir::new().unwrap();
        let options = StoreOptions {
            history_limit: Some(1),
            pretty: false,
        };
        let mut store = TaskStore::open_with(temp.path().join("tasks.json"), options);
        add(&mut store, "a");
        add(&mut store, "b");

        assert!(store.undo().unwrap());
        assert!(!store.undo().unwrap());
        assert_eq!(texts(&store), vec!["a"]);
    }

    #[test]
    fn test_filter() {
        let (_temp, mut store) = open_temp();
        let a = store.add("Buy milk", Priority::High, "", vec!["home".into()]).unwrap();
        store.add("Call bob", Priority::Low, "2025-05-05", Vec::new()).unwrap();
        store.add("Pay rent", Priority::High, "", Vec::new()).unwrap();
        store.toggle([a]).unwrap();

        let active: Vec<&str> = store
            .filter(&Filter::new(StatusFilter::Active, PriorityFilter::All, ""))
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(active, vec!["Call bob", "Pay rent"]);

        let high: Vec<&str> = store
            .filter(&Filter::new(StatusFilter::All, PriorityFilter::Only(Priority::High), ""))
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(high, vec!["Buy milk", "Pay rent"]);

        let query = store.filter(&Filter::new(StatusFilter::Completed, PriorityFilter::All, "HOME"));
        assert_eq!(query.len(), 1);
        assert_eq!(query[0].id, a);

        assert_eq!(store.filter(&Filter::default()).len(), 3);
    }

    #[test]
    fn test_save_failure_keeps_memory_consistent() {
        let temp = TempDir::new().unwrap();
        // A directory cannot be written as a file
        let mut store = TaskStore::open(temp.path());

        let err = store.add("a", Priority::Medium, "", Vec::new()).unwrap_err();
        assert!(err.is_io());
        assert_eq!(store.len(), 1);
        assert_dense(&store);

        // The failed write still recorded history
        assert!(store.undo().is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_all_renormalizes_and_snapshots() {
        let (temp, mut store) = open_temp();
        add(&mut store, "old");

        let mut incoming = vec![
            Task::new("second", Priority::Low, "", Vec::new(), 10),
            Task::new("first", Priority::Low, "", Vec::new(), 3),
        ];
        incoming[0].created_at = 1.0;
        store.replace_all(incoming).unwrap();
        assert_eq!(texts(&store), vec!["first", "second"]);
        assert_dense(&store);

        let on_disk = fs::read_to_string(temp.path().join("tasks.json")).unwrap();
        assert!(on_disk.contains("\"order_index\": 1"));

        store.undo().unwrap();
        assert_eq!(texts(&store), vec!["old"]);
    }
}
