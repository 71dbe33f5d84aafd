//! Configuration for the log watcher
//!
//! Raw [`Settings`] come from an optional TOML file and the command line. They
//! are validated once into an immutable [`Config`] that every aggregator and
//! the dispatcher share.

mod policy;
mod settings;

pub use policy::{AggregationPolicy, Presentation};
pub use settings::Settings;

use crate::error::ConfigError;
use crate::filters::FilterSet;
use std::path::Path;
use std::time::Duration;

/// Validated, immutable configuration bundle
#[derive(Debug, Clone)]
pub struct Config {
    /// Explicit paths to watch
    pub files: Vec<String>,
    /// Glob patterns expanded at startup
    pub globs: Vec<String>,
    /// Compiled begin/end/exclude patterns
    pub filters: FilterSet,
    /// Segmentation and tailing policy
    pub policy: AggregationPolicy,
    /// Webhook endpoint
    pub url: String,
    /// Static payload presentation
    pub presentation: Presentation,
}

impl Config {
    /// Load raw settings from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read and
    /// `ConfigError::TomlError` if it is not valid TOML for [`Settings`].
    pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Validate raw settings into a configuration bundle
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for a missing watch target, a
    /// missing webhook URL or a negative timeout, and
    /// `ConfigError::InvalidPattern` for a pattern that does not compile.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        if settings.files.is_empty() && settings.globs.is_empty() {
            return Err(ConfigError::ValidationError(
                "file or glob must be specified".to_string(),
            ));
        }

        let url = settings
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::ValidationError("webhook url must be specified".to_string()))?;

        if settings.timeout_ms < 0 {
            return Err(ConfigError::ValidationError(format!(
                "timeout must not be negative (got {})",
                settings.timeout_ms
            )));
        }

        if settings.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        let filters = FilterSet::compile(
            settings.begin.as_deref(),
            settings.end.as_deref(),
            &settings.exclude,
        )?;

        let policy = AggregationPolicy {
            max_lines: usize::try_from(settings.max_lines).unwrap_or(0),
            min_lines: usize::try_from(settings.min_lines).unwrap_or(1).max(1),
            timeout: Duration::from_millis(settings.timeout_ms.unsigned_abs()),
            start_at_end: settings.start_at_end,
            reopen_on_rotate: settings.reopen,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        };

        let presentation = Presentation {
            username: settings.username,
            prefix: settings.prefix,
            color: settings.color,
            syntax: settings.syntax,
            attach: !settings.no_attach,
        };

        Ok(Self {
            files: settings.files,
            globs: settings.globs,
            filters,
            policy,
            url,
            presentation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn base_settings() -> Settings {
        Settings {
            files: vec!["/var/log/app.log".to_string()],
            url: Some("http://localhost:8065/hooks/abc".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = Config::from_settings(base_settings()).unwrap();

        assert_eq!(config.policy.max_lines, 0);
        assert_eq!(config.policy.min_lines, 1);
        assert_eq!(config.policy.timeout, Duration::from_millis(1));
        assert!(!config.policy.start_at_end);
        assert!(!config.policy.reopen_on_rotate);
        assert_eq!(config.presentation.prefix, ":warning:");
        assert_eq!(config.presentation.color, "#FF0000");
        assert!(config.presentation.attach);
        assert!(!config.filters.has_begin());
    }

    #[test]
    fn test_missing_watch_target() {
        let settings = Settings {
            files: Vec::new(),
            ..base_settings()
        };
        let err = Config::from_settings(settings).unwrap_err();
        assert!(err.to_string().contains("file or glob"));
    }

    #[test]
    fn test_glob_alone_is_a_watch_target() {
        let settings = Settings {
            files: Vec::new(),
            globs: vec!["/var/log/*.log".to_string()],
            ..base_settings()
        };
        assert!(Config::from_settings(settings).is_ok());
    }

    #[test]
    fn test_missing_url() {
        let settings = Settings {
            url: None,
            ..base_settings()
        };
        assert!(matches!(
            Config::from_settings(settings),
            Err(ConfigError::ValidationError(_))
        ));

        let settings = Settings {
            url: Some("  ".to_string()),
            ..base_settings()
        };
        assert!(Config::from_settings(settings).is_err());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let settings = Settings {
            timeout_ms: -1,
            ..base_settings()
        };
        let err = Config::from_settings(settings).unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_zero_timeout_allowed() {
        let settings = Settings {
            timeout_ms: 0,
            ..base_settings()
        };
        let config = Config::from_settings(settings).unwrap();
        assert_eq!(config.policy.timeout, Duration::ZERO);
    }

    #[test]
    fn test_line_limits_normalized() {
        let settings = Settings {
            max_lines: -1,
            min_lines: -5,
            ..base_settings()
        };
        let config = Config::from_settings(settings).unwrap();
        assert_eq!(config.policy.max_lines, 0);
        assert_eq!(config.policy.min_lines, 1);

        let settings = Settings {
            max_lines: 20,
            min_lines: 0,
            ..base_settings()
        };
        let config = Config::from_settings(settings).unwrap();
        assert_eq!(config.policy.max_lines, 20);
        assert_eq!(config.policy.min_lines, 1);
    }

    #[test]
    fn test_invalid_regex_is_fatal() {
        let settings = Settings {
            end: Some("(unclosed".to_string()),
            ..base_settings()
        };
        assert!(matches!(
            Config::from_settings(settings),
            Err(ConfigError::InvalidPattern { kind: "end", .. })
        ));
    }

    #[test]
    fn test_load_settings_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
files = ["/var/log/app.log"]
url = "http://localhost/hooks/x"
begin = "^ERROR"
exclude = ["healthcheck"]
max_lines = 50
timeout_ms = 500
no_attach = true
syntax = "java"
"#
        )
        .unwrap();

        let settings = Config::load_settings(file.path()).unwrap();
        assert_eq!(settings.begin.as_deref(), Some("^ERROR"));
        assert_eq!(settings.min_lines, 1);

        let config = Config::from_settings(settings).unwrap();
        assert_eq!(config.policy.max_lines, 50);
        assert_eq!(config.policy.timeout, Duration::from_millis(500));
        assert!(!config.presentation.attach);
        assert_eq!(config.presentation.syntax, "java");
        assert!(config.filters.matches_begin("ERROR x"));
        assert!(config.filters.is_excluded(&["GET /healthcheck"]));
    }

    #[test]
    fn test_load_settings_missing_file() {
        let err = Config::load_settings(Path::new("/nonexistent/loghook.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_load_settings_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "maxlines = 3").unwrap();
        assert!(matches!(
            Config::load_settings(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }
}
