//! Stats command handler

use anyhow::Result;

use todo_core::{Repository, User};

use crate::output::Output;

/// Show task counts and daily goal progress
pub fn show(repo: &impl Repository, user: &User, output: &Output) -> Result<()> {
    let stats = repo.fetch_stats(user.id)?;
    output.print_stats(&stats, user.daily_goal);
    Ok(())
}
