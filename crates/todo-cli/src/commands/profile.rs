//! Profile command handlers

use anyhow::{Context, Result};

use todo_core::{ProfileUpdate, Repository, User};

use crate::output::Output;

/// Show the current user's profile
pub fn show(user: &User, output: &Output) -> Result<()> {
    output.print_profile(user);
    Ok(())
}

/// Changes requested on the command line
///
/// `None` leaves a field as it is; an empty string clears it.
#[derive(Debug, Default)]
pub struct ProfileArgs {
    pub display_name: Option<String>,
    pub focus_area: Option<String>,
    pub daily_goal: Option<u32>,
    pub clear_goal: bool,
}

/// Update the current user's profile
pub fn set(
    repo: &impl Repository,
    user: &User,
    args: ProfileArgs,
    output: &Output,
) -> Result<()> {
    let update = merge(user, args);
    let updated = repo
        .update_profile(user.id, &update)
        .context("Failed to update profile")?;

    output.success("Profile updated");
    output.print_profile(&updated);
    Ok(())
}

/// Apply the requested changes on top of the stored profile
fn merge(user: &User, args: ProfileArgs) -> ProfileUpdate {
    ProfileUpdate {
        display_name: args.display_name.or_else(|| user.display_name.clone()),
        focus_area: args.focus_area.or_else(|| user.focus_area.clone()),
        daily_goal: if args.clear_goal {
            None
        } else {
            args.daily_goal.or(user.daily_goal)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Output, OutputFormat};
    use todo_core::SqliteRepository;

    fn user() -> User {
        User {
            id: 1,
            name: "sam".into(),
            display_name: Some("Sam".into()),
            focus_area: Some("Garden".into()),
            daily_goal: Some(3),
        }
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let update = merge(
            &user(),
            ProfileArgs {
                focus_area: Some("Kitchen".into()),
                ..Default::default()
            },
        );
        assert_eq!(update.display_name.as_deref(), Some("Sam"));
        assert_eq!(update.focus_area.as_deref(), Some("Kitchen"));
        assert_eq!(update.daily_goal, Some(3));
    }

    #[test]
    fn test_merge_clear_goal() {
        let update = merge(
            &user(),
            ProfileArgs {
                clear_goal: true,
                ..Default::default()
            },
        );
        assert_eq!(update.daily_goal, None);
    }

    #[test]
    fn test_set_blank_display_name_clears_it() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let stored = repo.ensure_user("sam").unwrap();
        let output = Output::new(OutputFormat::Quiet);

        set(
            &repo,
            &stored,
            ProfileArgs {
                display_name: Some("Sammy".into()),
                daily_goal: Some(4),
                ..Default::default()
            },
            &output,
        )
        .unwrap();
        let stored = repo.find_user_by_name("sam").unwrap().unwrap();
        assert_eq!(stored.greeting_name(), "Sammy");

        set(
            &repo,
            &stored,
            ProfileArgs {
                display_name: Some(String::new()),
                ..Default::default()
            },
            &output,
        )
        .unwrap();
        let stored = repo.find_user_by_name("sam").unwrap().unwrap();
        assert_eq!(stored.display_name, None);
        assert_eq!(stored.daily_goal, Some(4));
        assert_eq!(stored.greeting_name(), "sam");
    }

    #[test]
    fn test_zero_goal_is_rejected() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let stored = repo.ensure_user("sam").unwrap();
        let output = Output::new(OutputFormat::Quiet);

        let result = set(
            &repo,
            &stored,
            ProfileArgs {
                daily_goal: Some(0),
                ..Default::default()
            },
            &output,
        );
        assert!(result.is_err());
    }
}
