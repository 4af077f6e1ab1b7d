// Display filtering for tasks

use crate::models::{Priority, Task};
use std::str::FromStr;

/// Completion-state filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Priority filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

/// All three display predicates. `Filter::default()` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub status: StatusFilter,
    pub priority: PriorityFilter,
    /// Case-insensitive substring; blank matches everything
    pub query: String,
}

impl Filter {
    pub fn new(status: StatusFilter, priority: PriorityFilter, query: impl Into<String>) -> Self {
        Self {
            status,
            priority,
            query: query.into(),
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.status.matches(task) && self.priority.matches(task) && self.query_matches(task)
    }

    fn query_matches(&self, task: &Task) -> bool {
        let query = self.query.trim().to_lowercase();
        query.is_empty() || task.haystack().to_lowercase().contains(&query)
    }
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl PriorityFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(p) => task.priority == p,
        }
    }
}

/// Error for unrecognised filter names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl std::fmt::Display for UnknownFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown filter value: {}", self.0)
    }
}

impl std::error::Error for UnknownFilter {}

impl FromStr for StatusFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" | "done" => Ok(StatusFilter::Completed),
            _ => Err(UnknownFilter(s.to_string())),
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(PriorityFilter::All);
        }
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .map(PriorityFilter::Only)
            .ok_or_else(|| UnknownFilter(s.to_string()))
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "All"),
            StatusFilter::Active => write!(f, "Active"),
            StatusFilter::Completed => write!(f, "Completed"),
        }
    }
}

impl std::fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityFilter::All => write!(f, "All"),
            PriorityFilter::Only(p) => write!(f, "{}", p),
        }
    }
}
