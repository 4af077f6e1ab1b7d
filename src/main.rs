use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use eyre::{Result, WrapErr};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tasklist::models::{normalize_due_date, parse_tags};
use tasklist::{Config, Filter, Priority, PriorityFilter, StatusFilter, Task, TaskEdit, TaskStore};
use tracing::Level;

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "TaskList CLI - personal task list with undo/redo and JSON/CSV transfer")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the task file (overrides the config file)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Action(Action),

    /// Interactive session; undo and redo are available here
    Shell,
}

/// Operations shared by one-shot commands and the shell
#[derive(Subcommand)]
enum Action {
    /// Show tasks
    List {
        /// All, Active or Completed
        #[arg(short, long, default_value = "All")]
        status: StatusFilter,

        /// All, Low, Medium or High
        #[arg(short, long, default_value = "All")]
        priority: PriorityFilter,

        /// Case-insensitive search text
        query: Vec<String>,
    },

    /// Add a task
    Add {
        #[arg(short, long, default_value = "Medium", value_parser = parse_priority)]
        priority: Priority,

        /// Due date, YYYY-MM-DD
        #[arg(short, long, default_value = "")]
        due: String,

        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,

        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Change fields of a task
    Edit {
        id: i64,

        #[arg(long)]
        text: Option<String>,

        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(short, long)]
        due: Option<String>,

        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Flip completion of tasks
    Toggle {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Delete tasks
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Move tasks to the top, in the given order
    Move {
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Replace all tasks with the contents of a file
    Import { format: Format, path: PathBuf },

    /// Write all tasks to a file
    Export { format: Format, path: PathBuf },
}

#[derive(Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Action(Action),

    /// Revert the last change
    Undo,

    /// Re-apply the last reverted change
    Redo,

    /// Save and leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Parser)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let path = cli.file.unwrap_or_else(|| config.storage_path.clone());

    // Open store
    let mut store = TaskStore::open_with(&path, config.store_options());

    match cli.command {
        None => print_tasks(&store, &Filter::default()),
        Some(Commands::Action(action)) => run_action(&mut store, action)?,
        Some(Commands::Shell) => run_shell(&mut store)?,
    }

    Ok(())
}

fn run_action(store: &mut TaskStore, action: Action) -> Result<()> {
    match action {
        Action::List {
            status,
            priority,
            query,
        } => {
            print_tasks(store, &Filter::new(status, priority, query.join(" ")));
        }
        Action::Add {
            priority,
            due,
            tags,
            text,
        } => {
            let id = store.add(&text.join(" "), priority, &normalize_due_date(&due), parse_tags(&tags))?;
            println!("Added task {}", id);
        }
        Action::Edit {
            id,
            text,
            priority,
            due,
            tags,
        } => {
            let changes = TaskEdit {
                text,
                due_date: due.as_deref().map(normalize_due_date),
                priority,
                tags: tags.as_deref().map(parse_tags),
            };
            if store.edit(id, changes)? {
                println!("Updated task {}", id);
            } else {
                println!("No task with id {}", id);
            }
        }
        Action::Toggle { ids } => {
            let count = store.toggle(ids)?;
            println!("Toggled {} task(s)", count);
        }
        Action::Delete { ids } => {
            let count = store.delete(ids)?;
            println!("Deleted {} task(s)", count);
        }
        Action::Move { ids } => {
            store.reorder(&ids)?;
            println!("Reordered tasks");
        }
        Action::Import { format, path } => {
            let count = match format {
                Format::Json => store.import_json(&path),
                Format::Csv => store.import_csv(&path),
            }
            .wrap_err_with(|| format!("Import from {:?} failed", path))?;
            println!("Imported {} task(s)", count);
        }
        Action::Export { format, path } => {
            match format {
                Format::Json => store.export_json(&path),
                Format::Csv => store.export_csv(&path),
            }
            .wrap_err_with(|| format!("Export to {:?} failed", path))?;
            println!("Exported {} task(s) to {}", store.len(), path.display());
        }
    }
    Ok(())
}

fn run_shell(store: &mut TaskStore) -> Result<()> {
    println!("tasklist shell: type `help` for commands, `quit` to leave");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let args = split_args(&line?);
        if args.is_empty() {
            continue;
        }

        let parsed = match ShellLine::try_parse_from(&args) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Covers --help output as well as real parse errors
                e.print().wrap_err("Failed to write to terminal")?;
                continue;
            }
        };

        let outcome = match parsed.command {
            ShellCommand::Action(action) => run_action(store, action),
            ShellCommand::Undo => report_history(store.undo(), "Undone", "Nothing to undo"),
            ShellCommand::Redo => report_history(store.redo(), "Redone", "Nothing to redo"),
            ShellCommand::Quit => break,
        };

        if let Err(e) = outcome {
            eprintln!("{} {:#}", "error:".red().bold(), e);
        }
    }

    store.save().wrap_err("Failed to save tasks on exit")?;
    Ok(())
}

fn report_history(result: tasklist::Result<bool>, done: &str, nothing: &str) -> Result<()> {
    if result? {
        println!("{}", done);
    } else {
        println!("{}", nothing);
    }
    Ok(())
}

fn print_tasks(store: &TaskStore, filter: &Filter) {
    let tasks = store.filter(filter);
    if tasks.is_empty() {
        println!("{}", "No tasks".dimmed());
        return;
    }

    let today = Local::now().date_naive();
    for task in tasks {
        println!("{}", format_task(task, today));
    }
}

fn format_task(task: &Task, today: chrono::NaiveDate) -> String {
    let status = if task.completed {
        "Done  ".green().to_string()
    } else {
        "Active".normal().to_string()
    };
    let padded = format!("{:<6}", task.priority.as_str());
    let priority = match task.priority {
        Priority::High => padded.red().to_string(),
        Priority::Medium => padded.yellow().to_string(),
        Priority::Low => padded.blue().to_string(),
    };
    let text = if task.completed {
        task.text.dimmed().to_string()
    } else {
        task.text.clone()
    };
    let due = if task.is_overdue(today) {
        task.due_date.red().bold().to_string()
    } else {
        task.due_date.clone()
    };

    let mut line = format!("{:>15}  {}  {}  {}", task.id, status, priority, text);
    if !task.due_date.is_empty() {
        line.push_str(&format!("  due {}", due));
    }
    if !task.tags.is_empty() {
        line.push_str(&format!("  [{}]", task.tags.join(", ").cyan()));
    }
    line
}

fn parse_priority(s: &str) -> std::result::Result<Priority, String> {
    Priority::ALL
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("expected Low, Medium or High, got `{}`", s))
}

/// Split a shell line on whitespace, honouring double quotes
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}
