//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use todo_core::{Task, TaskStats, TaskStatus, User};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single task with all fields
    pub fn print_task(&self, task: &Task) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", task.id);
                println!("Title:   {}", task.title);
                println!("Status:  {}", task.status);
                if let Some(ref notes) = task.notes {
                    println!("Notes:   {}", notes);
                }
                if let Some(ref due) = task.due_date {
                    println!("Due:     {}", due);
                }
                println!("Created: {}", task.created_at);
            }
            OutputFormat::Json => print_json(task),
            OutputFormat::Quiet => println!("{}", task.id),
        }
    }

    /// Print a list of tasks
    pub fn print_tasks(&self, tasks: &[Task]) {
        match self.format {
            OutputFormat::Human => {
                if tasks.is_empty() {
                    println!("No tasks found.");
                    return;
                }
                for task in tasks {
                    println!("{}", task_line(task));
                }
                println!("\n{} task(s)", tasks.len());
            }
            OutputFormat::Json => print_json(&tasks),
            OutputFormat::Quiet => {
                for task in tasks {
                    println!("{}", task.id);
                }
            }
        }
    }

    /// Print tasks grouped into TODO / DOING / DONE columns
    pub fn print_board(&self, tasks: &[Task]) {
        match self.format {
            OutputFormat::Human => print!("{}", board_text(tasks)),
            OutputFormat::Json => {
                let columns: Vec<_> = TaskStatus::all()
                    .iter()
                    .map(|status| {
                        let column: Vec<&Task> =
                            tasks.iter().filter(|t| t.status == *status).collect();
                        serde_json::json!({"status": status.as_str(), "tasks": column})
                    })
                    .collect();
                print_json(&columns);
            }
            OutputFormat::Quiet => {
                for status in TaskStatus::all() {
                    let ids: Vec<String> = tasks
                        .iter()
                        .filter(|t| t.status == status)
                        .map(|t| t.id.to_string())
                        .collect();
                    println!("{}: {}", status, ids.join(" "));
                }
            }
        }
    }

    /// Print a user's profile
    pub fn print_profile(&self, user: &User) {
        match self.format {
            OutputFormat::Human => {
                println!("Hello, {}!", user.greeting_name());
                println!();
                println!("Name:         {}", user.name);
                println!(
                    "Display name: {}",
                    user.display_name.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "Focus area:   {}",
                    user.focus_area.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "Daily goal:   {}",
                    user.daily_goal
                        .map(|g| g.to_string())
                        .unwrap_or_else(|| "(not set)".to_string())
                );
            }
            OutputFormat::Json => print_json(user),
            OutputFormat::Quiet => println!("{}", user.name),
        }
    }

    /// Print task counts, with progress towards the daily goal if one is set
    pub fn print_stats(&self, stats: &TaskStats, daily_goal: Option<u32>) {
        match self.format {
            OutputFormat::Human => {
                println!("Total:     {}", stats.total);
                println!("Completed: {}", stats.completed);
                println!("Remaining: {}", stats.remaining());
                if let Some(goal) = daily_goal {
                    println!("{}", goal_line(stats, goal));
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "total": stats.total,
                    "completed": stats.completed,
                    "remaining": stats.remaining(),
                    "daily_goal": daily_goal,
                    "goal_shortfall": daily_goal.map(|g| stats.goal_shortfall(g)),
                }));
            }
            OutputFormat::Quiet => {
                println!("{} {} {}", stats.total, stats.completed, stats.remaining());
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}

/// One-line summary of a task for list output
fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{:>4} [{}] {:<5} | {}",
        task.id,
        task.completion_label(),
        task.status.as_str(),
        truncate(&task.title, 50)
    );
    if let Some(ref due) = task.due_date {
        line.push_str(&format!(" (due {})", due));
    }
    line
}

/// Board view as text, one section per status
fn board_text(tasks: &[Task]) -> String {
    let mut text = String::new();
    for (i, status) in TaskStatus::all().iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        let column: Vec<&Task> = tasks.iter().filter(|t| t.status == *status).collect();
        text.push_str(&format!("{} ({})\n", status, column.len()));
        if column.is_empty() {
            text.push_str("  -\n");
        }
        for task in column {
            text.push_str(&format!("  #{} {}", task.id, truncate(&task.title, 60)));
            if let Some(ref due) = task.due_date {
                text.push_str(&format!(" (due {})", due));
            }
            text.push('\n');
        }
    }
    text
}

fn goal_line(stats: &TaskStats, goal: u32) -> String {
    match stats.goal_shortfall(goal) {
        0 => format!("Daily goal of {} reached", goal),
        left => format!("Daily goal: {} more to reach {}", left, goal),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
