//! Logging Infrastructure
//!
//! tracing setup for development (pretty stderr) and production
//! (daily-rotated files, optional JSON lines). Security events log
//! under the `security` target so they can be filtered or shipped
//! separately, e.g. `RUST_LOG=warn,security=info`.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with the default (env-driven) level
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON format and file output
///
/// `log_level` falls back to `RUST_LOG`, then `info`. When `log_dir`
/// exists, output rotates daily into `cadence-server.<date>` files.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // One JSON object per line for log shippers
    let json = json.unwrap_or(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "cadence-server");
            if json {
                builder.json().with_writer(file_appender).init();
            } else {
                builder.with_writer(file_appender).init();
            }
            return;
        }
    }

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
