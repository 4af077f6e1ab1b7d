// Data models for the task list

use chrono::NaiveDate;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicI64, Ordering};

/// Placeholder shown in empty due-date inputs
pub const DATE_HINT: &str = "YYYY-MM-DD";

/// Task priority. Anything unrecognised becomes `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Parse one of the exact names `Low`, `Medium`, `High`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            _ => None,
        }
    }

    /// Parse, falling back to `Medium`
    pub fn coerce(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One to-do item
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    /// Seconds since epoch
    pub created_at: f64,
    pub priority: Priority,
    /// Free-form, usually `YYYY-MM-DD`; empty when unset
    pub due_date: String,
    pub tags: Vec<String>,
    pub order_index: i64,
}

impl Task {
    /// Build a fresh task with a new id and creation time
    pub fn new(text: &str, priority: Priority, due_date: &str, tags: Vec<String>, order_index: i64) -> Self {
        Self {
            id: next_id(),
            text: text.trim().to_string(),
            completed: false,
            created_at: now_secs(),
            priority,
            due_date: due_date.trim().to_string(),
            tags: clean_tags(tags),
            order_index,
        }
    }

    /// Canonical ordering: `(order_index, created_at, id)`
    pub fn canonical_cmp(&self, other: &Self) -> CmpOrdering {
        self.order_index
            .cmp(&other.order_index)
            .then_with(|| self.created_at.total_cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Text searched by the query filter
    pub fn haystack(&self) -> String {
        [
            self.text.as_str(),
            self.due_date.as_str(),
            self.priority.as_str(),
            &self.tags.join(","),
        ]
        .join(" ")
    }

    /// The due date, if it is a valid `YYYY-MM-DD` date
    pub fn due_date_parsed(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d").ok()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date_parsed().is_some_and(|due| due < today)
    }
}

/// Sort tasks into canonical order
pub fn sort_canonical(tasks: &mut [Task]) {
    tasks.sort_by(Task::canonical_cmp);
}

/// Rewrite `order_index` as 0..N-1 following canonical order
pub fn renormalize(tasks: &mut [Task]) {
    sort_canonical(tasks);
    for (idx, task) in tasks.iter_mut().enumerate() {
        task.order_index = idx as i64;
    }
}

/// Split comma-separated tag input, trimming and dropping empties
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim tags and drop the empty ones, keeping order and duplicates
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Treat the input placeholder as "no due date"
pub fn normalize_due_date(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed == DATE_HINT {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Largest id accepted from external records (2^53 - 1, exact in any JSON reader)
pub const MAX_ID: i64 = (1 << 53) - 1;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Allocate a task id: wall-clock milliseconds, bumped past the last id handed out
pub fn next_id() -> i64 {
    let now = now_ms();
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last.saturating_add(1))))
        .unwrap_or_else(|last| last);
    now.max(prev.saturating_add(1))
}

/// Make sure later `next_id()` calls never return `id` or anything below it.
/// Ids above `MAX_ID` are ignored.
pub fn observe_id(id: i64) {
    if id > MAX_ID {
        return;
    }
    LAST_ID.fetch_max(id, Ordering::SeqCst);
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current time as fractional seconds since epoch
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
