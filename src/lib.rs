// TaskList - ordered personal task list with snapshot undo/redo and JSON/CSV transfer

pub mod config;
pub mod csv;
pub mod error;
pub mod filter;
pub mod history;
pub mod models;
pub mod record;
pub mod storage;
pub mod store;
pub mod transfer;

// Re-export main types for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{Filter, PriorityFilter, StatusFilter};
pub use history::{History, Snapshot};
pub use models::{Priority, Task, now_ms};
pub use store::{StoreOptions, TaskEdit, TaskStore};
