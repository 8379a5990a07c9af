//! Tracing subscriber setup

use std::fs::OpenOptions;
use std::sync::Mutex;

use todo_core::Config;
use tracing_subscriber::EnvFilter;

/// Filter used when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "info" } else { "warn" };
    format!("todo_core={},todo={}", level, level)
}

/// Install the global subscriber
///
/// Logs go to `log_file` when configured, otherwise stderr. Failure to open
/// the log file falls back to stderr with a warning.
pub fn init(config: &Config, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    if let Some(ref path) = config.log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = builder
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                return;
            }
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", path, e);
            }
        }
    }

    let _ = builder.with_writer(std::io::stderr).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "todo_core=warn,todo=warn");
        assert_eq!(default_filter(true), "todo_core=info,todo=info");
    }
}
