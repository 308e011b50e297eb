//! Mailbox password sources.
//!
//! The config may carry the password inline (`password`), point at a file
//! holding it (`passwordFile`, e.g. a Docker secret) or name an environment
//! variable (`passwordEnvVar`). When several are set the first non-empty one
//! in that order is used.

use std::fmt;
use std::path::PathBuf;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("no password configured (set password, passwordFile or passwordEnvVar)")]
    Missing,

    #[error("cannot read password file '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("password variable '{0}' is not set")]
    EnvVarUnset(String),

    #[error("password variable '{0}' is not valid UTF-8")]
    EnvVarInvalid(String),

    #[error("password from {0} is empty")]
    Empty(String),
}

/// Where the mailbox password comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource<'a> {
    Inline(&'a str),
    File(&'a str),
    EnvVar(&'a str),
}

impl<'a> PasswordSource<'a> {
    /// Picks the first non-empty source, inline value first.
    pub fn select(
        inline: Option<&'a str>,
        file: Option<&'a str>,
        env_var: Option<&'a str>,
    ) -> Option<Self> {
        let non_empty = |s: Option<&'a str>| s.filter(|s| !s.is_empty());

        non_empty(inline)
            .map(PasswordSource::Inline)
            .or_else(|| non_empty(file).map(PasswordSource::File))
            .or_else(|| non_empty(env_var).map(PasswordSource::EnvVar))
    }

    /// Reads the password. File contents and variable values are trimmed
    /// since both usually end in a newline.
    pub fn resolve(&self) -> Result<SecretString, SecretError> {
        let value = match *self {
            PasswordSource::Inline(value) => value.to_string(),
            PasswordSource::File(path) => {
                let path = PathBuf::from(expand_home(path));
                std::fs::read_to_string(&path)
                    .map_err(|source| SecretError::ReadFile { path, source })?
                    .trim()
                    .to_string()
            }
            PasswordSource::EnvVar(name) => match std::env::var(name) {
                Ok(value) => value.trim().to_string(),
                Err(std::env::VarError::NotPresent) => {
                    return Err(SecretError::EnvVarUnset(name.to_string()))
                }
                Err(std::env::VarError::NotUnicode(_)) => {
                    return Err(SecretError::EnvVarInvalid(name.to_string()))
                }
            },
        };

        if value.is_empty() {
            return Err(SecretError::Empty(self.to_string()));
        }
        Ok(SecretString::from(value))
    }
}

/// Names the source without revealing the password.
impl fmt::Display for PasswordSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordSource::Inline(_) => f.write_str("config file"),
            PasswordSource::File(path) => write!(f, "file '{}'", path),
            PasswordSource::EnvVar(name) => write!(f, "variable '{}'", name),
        }
    }
}

/// Expands a leading `~` to `$HOME`. `~user` forms are left alone.
pub(crate) fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };

    match std::env::var_os("HOME") {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_select_prefers_inline_then_file_then_env() {
        assert_eq!(
            PasswordSource::select(Some("pw"), Some("/f"), Some("VAR")),
            Some(PasswordSource::Inline("pw"))
        );
        assert_eq!(
            PasswordSource::select(Some(""), Some("/f"), Some("VAR")),
            Some(PasswordSource::File("/f"))
        );
        assert_eq!(
            PasswordSource::select(None, Some(""), Some("VAR")),
            Some(PasswordSource::EnvVar("VAR"))
        );
        assert_eq!(PasswordSource::select(Some(""), None, Some("")), None);
    }

    #[test]
    fn test_file_password_is_trimmed() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();
        let path = file.path().to_str().unwrap();

        let password = PasswordSource::File(path).resolve().unwrap();
        assert_eq!(password.expose_secret(), "s3cret");
    }

    #[test]
    fn test_missing_file() {
        let err = PasswordSource::File("/nonexistent/mailprint/password")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SecretError::ReadFile { .. }));
    }

    #[test]
    fn test_blank_file_is_empty_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file).unwrap();
        let path = file.path().to_str().unwrap();

        let err = PasswordSource::File(path).resolve().unwrap_err();
        assert!(matches!(err, SecretError::Empty(_)));
    }

    #[test]
    #[serial]
    fn test_env_var_password() {
        std::env::set_var("MAILPRINT_TEST_PASSWORD", "from-env\n");
        let password = PasswordSource::EnvVar("MAILPRINT_TEST_PASSWORD")
            .resolve()
            .unwrap();
        assert_eq!(password.expose_secret(), "from-env");
        std::env::remove_var("MAILPRINT_TEST_PASSWORD");
    }

    #[test]
    #[serial]
    fn test_unset_env_var() {
        std::env::remove_var("MAILPRINT_TEST_PASSWORD");
        let err = PasswordSource::EnvVar("MAILPRINT_TEST_PASSWORD")
            .resolve()
            .unwrap_err();
        assert!(matches!(err, SecretError::EnvVarUnset(name) if name == "MAILPRINT_TEST_PASSWORD"));
    }

    #[test]
    fn test_display_never_shows_inline_value() {
        assert_eq!(PasswordSource::Inline("hunter2").to_string(), "config file");
        assert_eq!(
            PasswordSource::EnvVar("IMAP_PW").to_string(),
            "variable 'IMAP_PW'"
        );
    }

    #[test]
    #[serial]
    fn test_expand_home() {
        let saved = std::env::var_os("HOME");
        std::env::set_var("HOME", "/home/mail");

        assert_eq!(expand_home("~/spool"), "/home/mail/spool");
        assert_eq!(expand_home("~"), "/home/mail");
        assert_eq!(expand_home("~alice/x"), "~alice/x");
        assert_eq!(expand_home("/etc/mailprint"), "/etc/mailprint");

        match saved {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
    }
}
