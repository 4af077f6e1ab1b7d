// JSON file operations for the persisted task list

use crate::error::{Error, Result};
use crate::models::{Task, next_id, observe_id, renormalize};
use crate::record;
use fs2::FileExt;
use serde_json::Value;
use serde_json::value::RawValue;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load the state file.
///
/// A missing file is an empty list. So is an unreadable or malformed one;
/// that case is logged and otherwise swallowed.
pub fn load_tasks(path: &Path) -> Vec<Task> {
    if !path.exists() {
        debug!(file = ?path, "State file does not exist yet, starting empty");
        return Vec::new();
    }

    let values = match read_json_array(path) {
        Ok(values) => values,
        Err(e) => {
            warn!(file = ?path, error = %e, "Failed to load state file, starting empty");
            return Vec::new();
        }
    };

    let mut tasks = decode_records(&values, path);
    renormalize(&mut tasks);

    info!(file = ?path, count = tasks.len(), "Loaded tasks");
    tasks
}

/// Write the collection as a JSON array, replacing the file's contents
pub fn write_tasks(path: &Path, tasks: &[Task], pretty: bool) -> Result<()> {
    let records = record::serialize_all(tasks);
    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };

    write_file(path, json.as_bytes())?;
    debug!(file = ?path, count = tasks.len(), "Wrote tasks");
    Ok(())
}

/// Read a file whose top-level value must be a JSON array.
///
/// Elements are parsed one at a time, so an element serde_json cannot hold
/// (such as a number out of `f64` range) is skipped with a warning instead of
/// failing the whole file.
pub fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let raw_items: Vec<&RawValue> = match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            let message = match serde_json::from_str::<&RawValue>(&content) {
                Ok(raw) => format!("expected a JSON array of tasks, found {}", json_kind(raw)),
                Err(_) => format!("invalid JSON: {}", e),
            };
            return Err(Error::format(path, message));
        }
    };

    let mut items = Vec::with_capacity(raw_items.len());
    for (idx, raw) in raw_items.into_iter().enumerate() {
        match serde_json::from_str::<Value>(raw.get()) {
            Ok(value) => items.push(value),
            Err(e) => warn!(file = ?path, index = idx, error = %e, "Skipping unreadable element"),
        }
    }
    Ok(items)
}

/// Decode record values into tasks.
///
/// Non-object elements and records without text are skipped. An id already
/// used earlier in the same list is replaced with a fresh one.
pub(crate) fn decode_records(values: &[Value], source: &Path) -> Vec<Task> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(values.len());

    for (idx, value) in values.iter().enumerate() {
        let mut task = match record::deserialize(value) {
            Ok(decoded) => decoded.task,
            Err(e) => {
                warn!(file = ?source, index = idx, error = %e, "Skipping malformed record");
                continue;
            }
        };

        if task.text.trim().is_empty() {
            warn!(file = ?source, index = idx, "Skipping record with empty text");
            continue;
        }

        if !seen.insert(task.id) {
            let fresh = next_id();
            warn!(file = ?source, index = idx, id = task.id, fresh, "Duplicate id, assigning a fresh one");
            task.id = fresh;
            seen.insert(fresh);
        }

        observe_id(task.id);
        tasks.push(task);
    }

    tasks
}

/// Overwrite `path` with `bytes` under an exclusive lock
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| Error::io(path, e))?;

    // Truncate only once the lock is held
    file.lock_exclusive().map_err(|e| Error::io(path, e))?;
    file.set_len(0).map_err(|e| Error::io(path, e))?;
    file.write_all(bytes).map_err(|e| Error::io(path, e))?;
    file.sync_all().map_err(|e| Error::io(path, e))?;

    // Lock is automatically released when file is dropped
    Ok(())
}

fn json_kind(raw: &RawValue) -> &'static str {
    match raw.get().trim_start().as_bytes().first() {
        Some(b'n') => "null",
        Some(b't' | b'f') => "a boolean",
        Some(b'"') => "a string",
        Some(b'[') => "an array",
        Some(b'{') => "an object",
        _ => "a number",
    }
}
