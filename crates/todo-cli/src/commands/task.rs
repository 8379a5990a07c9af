//! Task command handlers

use anyhow::{bail, Context, Result};

use todo_core::{NewTask, Repository, TaskStatus, User};

use crate::output::Output;
use crate::prompt::confirm;

/// Add a new task
pub fn add(
    repo: &impl Repository,
    user: &User,
    title: String,
    notes: Option<String>,
    due: Option<String>,
    output: &Output,
) -> Result<()> {
    let new_task = NewTask::new(title).notes(notes).due_date(due);
    let task = repo
        .add_task(user.id, &new_task)
        .context("Failed to add task")?;

    output.success(&format!("Added task {}", task.id));
    output.print_task(&task);
    Ok(())
}

/// List tasks, optionally filtered by status
pub fn list(
    repo: &impl Repository,
    user: &User,
    status: Option<TaskStatus>,
    output: &Output,
) -> Result<()> {
    let tasks = match status {
        Some(status) => repo.fetch_tasks_by_status(user.id, status)?,
        None => repo.fetch_tasks(user.id)?,
    };

    output.print_tasks(&tasks);
    Ok(())
}

/// Show tasks grouped by status
pub fn board(repo: &impl Repository, user: &User, output: &Output) -> Result<()> {
    let tasks = repo.fetch_tasks(user.id)?;
    output.print_board(&tasks);
    Ok(())
}

/// Move a task to another status
pub fn set_status(
    repo: &impl Repository,
    user: &User,
    id: i64,
    status: TaskStatus,
    output: &Output,
) -> Result<()> {
    if !repo.update_task_status(user.id, id, status)? {
        bail!("Task not found: {}", id);
    }

    output.success(&format!("Task {} is now {}", id, status));
    Ok(())
}

/// Mark a task as done
pub fn done(repo: &impl Repository, user: &User, id: i64, output: &Output) -> Result<()> {
    if !repo.mark_complete(user.id, id)? {
        bail!("Task not found: {}", id);
    }

    output.success(&format!("Completed task {}", id));
    Ok(())
}

/// Reopen a task
pub fn undo(repo: &impl Repository, user: &User, id: i64, output: &Output) -> Result<()> {
    if !repo.mark_incomplete(user.id, id)? {
        bail!("Task not found: {}", id);
    }

    output.success(&format!("Reopened task {}", id));
    Ok(())
}

/// Delete a task
pub fn delete(
    repo: &impl Repository,
    user: &User,
    id: i64,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let task = repo
        .fetch_tasks(user.id)?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| anyhow::anyhow!("Task not found: {}", id))?;

    // Confirm deletion
    if !yes && output.should_prompt() {
        println!("Delete task: {} - {}", task.id, task.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if !repo
        .delete_task(user.id, id)
        .context("Failed to delete task")?
    {
        bail!("Task not found: {}", id);
    }

    output.success(&format!("Deleted task {}", id));
    Ok(())
}
