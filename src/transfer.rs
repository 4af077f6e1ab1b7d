// JSON and CSV import/export
//
// Imports parse the whole source before touching the store, so a
// structural error leaves the collection as it was. A successful import is a
// wholesale replacement and can be undone like any other mutation.

use crate::csv;
use crate::error::{Error, Result};
use crate::models::{Priority, Task, next_id, now_secs, parse_tags};
use crate::storage;
use crate::store::TaskStore;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Fixed CSV column layout
pub const CSV_HEADER: [&str; 8] = [
    "id",
    "text",
    "completed",
    "created_at",
    "priority",
    "due_date",
    "tags",
    "order_index",
];

const TRUTHY: [&str; 4] = ["1", "true", "yes", "y"];

impl TaskStore {
    /// Write all tasks, in canonical order, as a JSON array. Layout follows
    /// the store's `pretty` option.
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        storage::write_tasks(path, self.tasks(), self.pretty)?;
        info!(file = ?path, count = self.len(), "Exported JSON");
        Ok(())
    }

    /// Replace all tasks with those in a JSON array file. Returns the number imported.
    pub fn import_json<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let values = storage::read_json_array(path)?;
        let tasks = storage::decode_records(&values, path);

        let count = tasks.len();
        if count < values.len() {
            warn!(file = ?path, skipped = values.len() - count, "Skipped malformed records");
        }

        self.replace_all(tasks)?;
        info!(file = ?path, count, "Imported JSON");
        Ok(count)
    }

    /// Write all tasks as CSV with a header row
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let out = tasks_to_csv(self.tasks());
        storage::write_file(path, out.as_bytes())?;
        info!(file = ?path, count = self.len(), "Exported CSV");
        Ok(())
    }

    /// Replace all tasks with the rows of a CSV file. Returns the number imported.
    ///
    /// The `id` column is ignored; every row gets a fresh id.
    pub fn import_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let tasks = tasks_from_csv(&content).map_err(|message| Error::format(path, message))?;

        let count = tasks.len();
        self.replace_all(tasks)?;
        info!(file = ?path, count, "Imported CSV");
        Ok(count)
    }
}

/// Render tasks as CSV text
pub fn tasks_to_csv(tasks: &[Task]) -> String {
    let mut out = String::new();
    csv::write_row(&mut out, &CSV_HEADER);

    for task in tasks {
        let row = [
            task.id.to_string(),
            task.text.clone(),
            task.completed.to_string(),
            task.created_at.to_string(),
            task.priority.to_string(),
            task.due_date.clone(),
            task.tags.join(","),
            task.order_index.to_string(),
        ];
        csv::write_row(&mut out, &row);
    }

    out
}

/// Build tasks from CSV text with a header row
pub fn tasks_from_csv(content: &str) -> std::result::Result<Vec<Task>, String> {
    let rows = csv::parse(content).map_err(|e| e.to_string())?;
    let mut rows = rows.into_iter();

    let header = rows.next().ok_or_else(|| "missing header row".to_string())?;
    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().to_string(), idx))
        .collect();
    if !columns.contains_key("text") {
        return Err("header has no `text` column".to_string());
    }

    let mut tasks = Vec::new();
    for (row_num, row) in rows.enumerate() {
        let field = |name: &str| column(&columns, &row, name);

        let text = field("text").trim();
        if text.is_empty() {
            warn!(row = row_num + 1, "Skipping CSV row with empty text");
            continue;
        }

        let completed = TRUTHY.contains(&field("completed").trim().to_lowercase().as_str());
        let order_index = field("order_index")
            .trim()
            .parse::<i64>()
            .unwrap_or(tasks.len() as i64);
        let created_at = field("created_at")
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .unwrap_or_else(now_secs);

        tasks.push(Task {
            id: next_id(),
            text: text.to_string(),
            completed,
            created_at,
            priority: Priority::coerce(field("priority").trim()),
            due_date: field("due_date").trim().to_string(),
            tags: parse_tags(field("tags")),
            order_index,
        });
    }

    Ok(tasks)
}

// Missing columns and short rows read as empty
fn column<'a>(columns: &HashMap<String, usize>, row: &'a [String], name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|&idx| row.get(idx))
        .map(String::as_str)
        .unwrap_or("")
}
