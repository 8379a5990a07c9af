//! todo CLI
//!
//! Command-line interface for todo - personal tasks with a TCP sync server.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use todo_core::{Config, Repository, SqliteRepository, TaskStatus, User};

mod commands;
mod logging;
mod output;
mod prompt;

use commands::profile::ProfileArgs;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "todo - Personal task lists with push-and-report sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Act as this user (defaults to the configured user)
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
    /// Show task counts and daily goal progress
    Stats,
    /// Exchange tasks with a sync server
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Run the task sync server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Port to listen on (defaults to sync_port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a new task
    #[command(alias = "new")]
    Add {
        /// Task title
        title: String,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Due date, e.g. 2024-06-01
        #[arg(short, long)]
        due: Option<String>,
    },
    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Only show tasks with this status (todo, doing, done)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },
    /// Show tasks grouped by status
    Board,
    /// Move a task to another status
    Status {
        /// Task ID
        id: i64,
        /// New status (todo, doing, done)
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Mark a task as done
    Done {
        /// Task ID
        id: i64,
    },
    /// Mark a task as not done
    Undo {
        /// Task ID
        id: i64,
    },
    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        /// Task ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields (an empty value clears a field)
    Set {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        focus_area: Option<String>,
        /// Tasks to complete per day
        #[arg(long, conflicts_with = "no_goal")]
        daily_goal: Option<u32>,
        /// Remove the daily goal
        #[arg(long)]
        no_goal: bool,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Push all your tasks to the sync server
    Push {
        /// Server host (defaults to sync_host)
        #[arg(long)]
        host: Option<String>,
        /// Server port (defaults to sync_port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch the CSV report of the last push
    Report {
        /// Server host (defaults to sync_host)
        #[arg(long)]
        host: Option<String>,
        /// Server port (defaults to sync_port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, user, sync_host, sync_port, sync_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Strict, case-insensitive status parsing for arguments
fn parse_status(value: &str) -> Result<TaskStatus, String> {
    value.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work on the file itself
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    let verbose = cli.verbose || matches!(cli.command, Commands::Serve { .. });
    logging::init(&config, verbose);

    match cli.command {
        Commands::Serve { bind, port } => {
            commands::sync::serve(&config, bind, port, &output).await
        }
        Commands::Sync {
            command: SyncCommands::Report { host, port, output: target },
        } => {
            let client = commands::sync::client_for(&config, host, port);
            commands::sync::report(&client, target, &output).await
        }
        command => {
            let repo = SqliteRepository::open(&config).with_context(|| {
                format!("Failed to open database: {:?}", config.database_path())
            })?;
            let user = resolve_user(&repo, cli.user.as_deref(), &config)?;
            handle_user_command(command, &repo, &user, &config, &output).await
        }
    }
}

/// Pick the acting user: --user, then the configured user
fn resolve_user(repo: &impl Repository, name: Option<&str>, config: &Config) -> Result<User> {
    let name = name.or(config.user.as_deref()).ok_or_else(|| {
        anyhow::anyhow!(
            "No user selected. Pass --user NAME or set a default with:\n  \
             todo config set user NAME"
        )
    })?;

    repo.ensure_user(name)
        .with_context(|| format!("Failed to load user '{}'", name))
}

async fn handle_user_command(
    command: Commands,
    repo: &SqliteRepository,
    user: &User,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Commands::Task { command } => handle_task_command(command, repo, user, output),
        Commands::Profile { command } => match command {
            Some(ProfileCommands::Show) | None => commands::profile::show(user, output),
            Some(ProfileCommands::Set {
                display_name,
                focus_area,
                daily_goal,
                no_goal,
            }) => commands::profile::set(
                repo,
                user,
                ProfileArgs {
                    display_name,
                    focus_area,
                    daily_goal,
                    clear_goal: no_goal,
                },
                output,
            ),
        },
        Commands::Stats => commands::stats::show(repo, user, output),
        Commands::Sync {
            command: SyncCommands::Push { host, port },
        } => {
            let client = commands::sync::client_for(config, host, port);
            commands::sync::push(repo, user, &client, output).await
        }
        Commands::Sync {
            command: SyncCommands::Report { .. },
        }
        | Commands::Serve { .. }
        | Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

fn handle_task_command(
    command: TaskCommands,
    repo: &SqliteRepository,
    user: &User,
    output: &Output,
) -> Result<()> {
    match command {
        TaskCommands::Add { title, notes, due } => {
            commands::task::add(repo, user, title, notes, due, output)
        }
        TaskCommands::List { status } => commands::task::list(repo, user, status, output),
        TaskCommands::Board => commands::task::board(repo, user, output),
        TaskCommands::Status { id, status } => {
            commands::task::set_status(repo, user, id, status, output)
        }
        TaskCommands::Done { id } => commands::task::done(repo, user, id, output),
        TaskCommands::Undo { id } => commands::task::undo(repo, user, id, output),
        TaskCommands::Delete { id, yes } => commands::task::delete(repo, user, id, yes, output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}
