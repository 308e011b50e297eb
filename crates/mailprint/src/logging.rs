//! Tracing subscriber setup: stderr always, plus an optional plain-text file.

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Picks the filter directive: `-v` raises the configured level to debug,
/// `-vv` to trace.
pub fn level_for(config: &LoggingConfig, verbosity: u8) -> &str {
    match verbosity {
        0 => config.level.as_str(),
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over both the
/// config and the verbosity flag.
pub fn init(config: &LoggingConfig, verbosity: u8) {
    let level = level_for(config, verbosity);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let file_writer = config.file.as_deref().and_then(file_appender);

    match file_writer {
        Some(appender) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .init();
        }
    }
}

fn file_appender(path: &Path) -> Option<tracing_appender::rolling::RollingFileAppender> {
    let file_name = path.file_name()?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!(
            "mailprint: cannot create log directory {}: {}; logging to stderr only",
            dir.display(),
            e
        );
        return None;
    }

    Some(tracing_appender::rolling::never(dir, file_name))
}
