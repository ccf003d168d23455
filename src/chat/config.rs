//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg`, an optional YAML
//! configuration file, and the resolved [`ChatConfig`].

use std::env;
use std::path::Path;
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::client::parse_endpoint;
use crate::error::{Error, Result};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/ask";

/// Environment variable consulted for the endpoint.
pub const ENDPOINT_ENV_VAR: &str = "EMOCHAT_ENDPOINT";

/// Default diagnostic log level.
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Command-line arguments for the emochat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Prompt endpoint URL.
    #[arrrg(optional, "Prompt endpoint URL (default: $EMOCHAT_ENDPOINT)", "URL")]
    pub endpoint: Option<String>,

    /// Path to a YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Per-request timeout in seconds (default: none)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Diagnostic log level.
    #[arrrg(optional, "Diagnostic log level (default: warn)", "LEVEL")]
    pub log_level: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML configuration file.
///
/// Every key is optional; command-line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_color: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config {}", path.display()), err)
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments, the config file and the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// The URL prompts are posted to.
    pub endpoint: String,

    /// Per-request timeout.  `None` waits indefinitely.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Level for diagnostic log records.
    pub log_level: String,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: `http://localhost:8000/api/ask`
    /// - Timeout: none
    /// - Color: enabled
    /// - Log level: warn
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            use_color: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Sets the diagnostic log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// The diagnostic log level as a tracing level.
    pub fn level(&self) -> Result<tracing::Level> {
        self.log_level.trim().parse::<tracing::Level>().map_err(|_| {
            Error::configuration(format!(
                "unknown log level {:?}; expected trace, debug, info, warn or error",
                self.log_level
            ))
        })
    }

    /// Checks that the endpoint is an absolute http(s) URL, the timeout is
    /// non-zero and the log level is known.
    pub fn validate(&self) -> Result<()> {
        parse_endpoint(&self.endpoint)?;
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::configuration("timeout must be at least one second"));
        }
        self.level()?;
        Ok(())
    }

    /// Resolve the configuration from arguments and the process environment.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        Self::resolve(args, env::var(ENDPOINT_ENV_VAR).ok())
    }

    /// Resolve the configuration.
    ///
    /// Precedence is command line, then config file, then `env_endpoint`,
    /// then the defaults.
    pub fn resolve(args: ChatArgs, env_endpoint: Option<String>) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };

        let endpoint = args
            .endpoint
            .or(file.endpoint)
            .or(env_endpoint.filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = args
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs);
        let use_color = !args.no_color && file.use_color.unwrap_or(true);
        let log_level = args
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let config = ChatConfig {
            endpoint,
            timeout,
            use_color,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.timeout.is_none());
        assert!(config.use_color);
        assert_eq!(config.log_level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::resolve(ChatArgs::default(), None).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn env_endpoint_used_when_no_flag() {
        let config =
            ChatConfig::resolve(ChatArgs::default(), Some("https://env.test/ask".to_string()))
                .unwrap();
        assert_eq!(config.endpoint, "https://env.test/ask");

        let config = ChatConfig::resolve(ChatArgs::default(), Some("  ".to_string())).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            endpoint: Some("https://flag.test/api/ask".to_string()),
            config: None,
            timeout_secs: Some(30),
            log_level: Some("debug".to_string()),
            no_color: true,
        };
        let config = ChatConfig::resolve(args, Some("https://env.test/ask".to_string())).unwrap();
        assert_eq!(config.endpoint, "https://flag.test/api/ask");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_level, "debug");
        assert!(!config.use_color);
    }

    #[test]
    fn file_sits_between_flags_and_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "endpoint: https://file.test/api/ask\ntimeout_secs: 12\nuse_color: false"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = ChatArgs {
            config: Some(path.clone()),
            ..ChatArgs::default()
        };
        let config = ChatConfig::resolve(args, Some("https://env.test/ask".to_string())).unwrap();
        assert_eq!(config.endpoint, "https://file.test/api/ask");
        assert_eq!(config.timeout, Some(Duration::from_secs(12)));
        assert!(!config.use_color);

        let args = ChatArgs {
            config: Some(path),
            endpoint: Some("https://flag.test/ask".to_string()),
            timeout_secs: Some(3),
            ..ChatArgs::default()
        };
        let config = ChatConfig::resolve(args, None).unwrap();
        assert_eq!(config.endpoint, "https://flag.test/ask");
        assert_eq!(config.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn file_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "endpoint: https://file.test\nretries: 3").unwrap();
        let err = FileConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let args = ChatArgs {
            config: Some("/nonexistent/emochat.yaml".to_string()),
            ..ChatArgs::default()
        };
        let err = ChatConfig::resolve(args, None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let args = ChatArgs {
            endpoint: Some("oo-4.onrender.com/api/ask".to_string()),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::resolve(args, None).is_err());
        assert!(ChatConfig::new().with_timeout(Some(Duration::ZERO)).validate().is_err());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_endpoint("https://example.test/api/ask")
            .with_timeout(Some(Duration::from_secs(9)))
            .without_color()
            .with_log_level("info");
        assert_eq!(config.endpoint, "https://example.test/api/ask");
        assert_eq!(config.timeout, Some(Duration::from_secs(9)));
        assert!(!config.use_color);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn unknown_log_level_rejected() {
        let err = ChatConfig::new().with_log_level("loud").validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("loud"));

        let args = ChatArgs {
            log_level: Some("verbose".to_string()),
            ..ChatArgs::default()
        };
        assert!(matches!(
            ChatConfig::resolve(args, None),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn known_log_levels_accepted() {
        for level in ["trace", "debug", "info", "warn", "error", "DEBUG"] {
            let config = ChatConfig::new().with_log_level(level);
            assert!(config.validate().is_ok(), "{level}");
        }
        let config = ChatConfig::new().with_log_level("debug");
        assert_eq!(config.level().unwrap(), tracing::Level::DEBUG);
    }

    fn command_line_options<T: arrrg::CommandLine + Default>() -> T {
        T::default()
    }

    #[test]
    fn chat_args_derive_command_line() {
        let args: ChatArgs = command_line_options();
        assert_eq!(args, ChatArgs::default());
        assert!(!args.no_color);
    }
}
