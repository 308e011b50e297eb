use std::path::{Path, PathBuf};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::expand_home;

/// Locations tried, in order, when no config path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["mailprint.yaml", "/etc/mailprint.yaml"];

/// Picks the config file to load: the explicit path if given, otherwise the
/// first of [`DEFAULT_CONFIG_PATHS`] that exists.
pub fn find_config(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or_else(|| ConfigError::NotFound {
            searched: DEFAULT_CONFIG_PATHS.join(", "),
        })
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let mut config: Config = serde_yaml::from_str(content)?;

    validate_config(&config)?;

    let expanded = expand_home(&config.storage.directory.to_string_lossy());
    config.storage.directory = PathBuf::from(expanded);

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mailbox = &config.mailbox;

    require_non_empty("mailbox.host", &mailbox.host)?;
    require_non_empty("mailbox.username", &mailbox.username)?;
    require_non_empty("mailbox.folder", &mailbox.folder)?;
    require_non_empty("printer.name", &config.printer.name)?;

    if mailbox.port == 0 {
        return Err(invalid("mailbox.port must be between 1 and 65535"));
    }

    if mailbox.poll_interval < 1 {
        return Err(invalid("mailbox.pollInterval must be at least 1 second"));
    }

    if mailbox.timeout < 1 {
        return Err(invalid("mailbox.timeout must be at least 1 second"));
    }

    if mailbox.password_source().is_none() {
        return Err(invalid(
            "mailbox needs one of password, passwordFile or passwordEnvVar",
        ));
    }

    if config.storage.directory.as_os_str().is_empty() {
        return Err(invalid("storage.directory must not be empty"));
    }

    if let Some(host) = &config.printer.host {
        require_non_empty("printer.host", host)?;
    }

    validate_log_level(&config.logging.level)?;

    Ok(())
}

/// Accepts a level name (`info`, `off`, ...) or an `EnvFilter` directive
/// list such as `info,mailprint=debug`. A bare word must be a level, so a
/// typo is not taken as a target name.
fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    let bad = || invalid(&format!("logging.level '{}' is not a valid log level", level));

    for directive in level.split(',').map(str::trim) {
        if directive.is_empty() {
            return Err(bad());
        }
        if !directive.contains(['=', '[']) && directive.parse::<LevelFilter>().is_err() {
            return Err(bad());
        }
    }

    EnvFilter::try_new(level).map_err(|_| bad())?;
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(invalid(&format!("{} must not be empty", field)));
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Validation {
        message: message.to_string(),
    }
}
