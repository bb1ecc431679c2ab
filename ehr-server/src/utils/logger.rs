//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.
//! `RUST_LOG` wins over the configured level when it is set.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional JSON formatting and file output
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // File output if the directory exists
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "ehr-server");
            let builder = builder.with_ansi(false).with_writer(file_appender);
            let result = if json.unwrap_or(false) {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            if let Err(e) = result {
                eprintln!("Logger already initialized: {e}");
            }
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    let result = if json.unwrap_or(false) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
}

/// Remove rolled log files older than `days` from `log_dir`.
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &str, days: u64) -> std::io::Result<usize> {
    let cutoff = std::time::SystemTime::now()
        .checked_sub(std::time::Duration::from_secs(days * 24 * 60 * 60))
        .unwrap_or(std::time::UNIX_EPOCH);

    let mut removed = 0;
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ours = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("ehr-server"));
        if !is_ours || !path.is_file() {
            continue;
        }
        if entry.metadata()?.modified()? < cutoff {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}
