// Task <-> JSON record conversion
//
// `deserialize` is fed externally sourced data (state file, imports), so each
// field is parsed explicitly and every fallback to a default is reported.

use crate::models::{MAX_ID, Priority, Task, clean_tags, next_id, now_secs};
use serde_json::{Map, Value, json};
use tracing::debug;

/// Why a field fell back to its default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    Missing,
    Invalid,
}

/// One defaulting decision made while decoding a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaulted {
    pub field: &'static str,
    pub reason: DefaultReason,
}

impl std::fmt::Display for Defaulted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.reason {
            DefaultReason::Missing => write!(f, "{}: missing", self.field),
            DefaultReason::Invalid => write!(f, "{}: invalid", self.field),
        }
    }
}

/// A decoded task together with the defaults applied to build it
#[derive(Debug, Clone)]
pub struct Decoded {
    pub task: Task,
    pub defaulted: Vec<Defaulted>,
}

/// The value was not a JSON object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotARecord;

impl std::fmt::Display for NotARecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "value is not a record object")
    }
}

impl std::error::Error for NotARecord {}

/// Encode a task as a record object
pub fn serialize(task: &Task) -> Value {
    json!({
        "id": task.id,
        "text": task.text,
        "completed": task.completed,
        "created_at": task.created_at,
        "priority": task.priority.as_str(),
        "due_date": task.due_date,
        "tags": task.tags,
        "order_index": task.order_index,
    })
}

/// Decode a record object, defaulting missing or malformed fields
pub fn deserialize(value: &Value) -> Result<Decoded, NotARecord> {
    let obj = value.as_object().ok_or(NotARecord)?;
    let mut fields = FieldReader {
        obj,
        defaulted: Vec::new(),
    };

    let id = fields
        .read("id", |v| as_integer(v).filter(|&id| id <= MAX_ID))
        .unwrap_or_else(next_id);
    let text = fields.read("text", |v| v.as_str().map(str::to_string)).unwrap_or_default();
    let completed = fields.read("completed", Value::as_bool).unwrap_or(false);
    let created_at = fields.read("created_at", Value::as_f64).unwrap_or_else(now_secs);
    let priority = fields
        .read("priority", |v| v.as_str().and_then(Priority::parse))
        .unwrap_or_default();
    let due_date = fields
        .read("due_date", |v| v.as_str().map(str::to_string))
        .unwrap_or_default();
    let tags = fields.read_tags();
    let order_index = fields.read("order_index", as_integer).unwrap_or(0);

    let FieldReader { defaulted, .. } = fields;
    if !defaulted.is_empty() {
        debug!(id, defaulted = ?defaulted, "Applied defaults while decoding record");
    }

    Ok(Decoded {
        task: Task {
            id,
            text,
            completed,
            created_at,
            priority,
            due_date,
            tags,
            order_index,
        },
        defaulted,
    })
}

pub fn serialize_all(tasks: &[Task]) -> Vec<Value> {
    tasks.iter().map(serialize).collect()
}

struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    defaulted: Vec<Defaulted>,
}

impl FieldReader<'_> {
    fn read<T>(&mut self, field: &'static str, parse: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
        match self.obj.get(field) {
            None | Some(Value::Null) => {
                self.note(field, DefaultReason::Missing);
                None
            }
            Some(v) => {
                let parsed = parse(v);
                if parsed.is_none() {
                    self.note(field, DefaultReason::Invalid);
                }
                parsed
            }
        }
    }

    // Tags tolerate null (treated as empty) and drop non-string or blank entries
    fn read_tags(&mut self) -> Vec<String> {
        match self.obj.get("tags") {
            None => {
                self.note("tags", DefaultReason::Missing);
                Vec::new()
            }
            Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => {
                let strings: Vec<String> = items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();
                let total = items.len();
                let tags = clean_tags(strings);
                if tags.len() != total {
                    self.note("tags", DefaultReason::Invalid);
                }
                tags
            }
            Some(_) => {
                self.note("tags", DefaultReason::Invalid);
                Vec::new()
            }
        }
    }

    fn note(&mut self, field: &'static str, reason: DefaultReason) {
        self.defaulted.push(Defaulted { field, reason });
    }
}

// Accepts integers and integral floats (e.g. `3.0` written by other tools)
fn as_integer(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    v.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}
