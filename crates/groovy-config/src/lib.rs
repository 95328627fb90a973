//! Configuration for the Groovy analysis core.
//!
//! The parser options mirror the host compiler's configuration record; the
//! logging section only controls how [`init_tracing`] installs a subscriber.

use std::fmt;
use std::path::Path;
use std::sync::Once;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::prelude::*;

/// Groovy language level. Only affects which syntax the front end accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LanguageLevel {
    #[serde(rename = "2.5")]
    Groovy2_5,
    #[serde(rename = "3.0")]
    Groovy3,
    #[serde(rename = "4.0")]
    Groovy4,
}

impl LanguageLevel {
    /// Lambdas, `!in`, `!instanceof` and `?[` arrived with the Parrot parser.
    pub fn supports_parrot_syntax(self) -> bool {
        self >= LanguageLevel::Groovy3
    }
}

impl Default for LanguageLevel {
    fn default() -> Self {
        LanguageLevel::Groovy3
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LanguageLevel::Groovy2_5 => "2.5",
            LanguageLevel::Groovy3 => "3.0",
            LanguageLevel::Groovy4 => "4.0",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ParserConfig {
    pub language_level: LanguageLevel,
    /// Width of a tab stop when computing columns.
    pub tab_size: u32,
    pub character_encoding: String,
    /// Keep the front end's token stream on the parse result.
    pub store_tokens: bool,
    /// Extract source comments and attach them to declarations.
    pub attribute_comments: bool,
    /// Keep going past syntax errors and return a partial tree.
    pub lenient_mode: bool,
    /// Surface front-end warnings as problems.
    pub collect_warnings: bool,
    /// Number of errors the front end collects before giving up.
    pub tolerance: u32,
    /// Upper bound on blank-and-reparse attempts in lenient mode.
    pub max_recovery_attempts: u32,
}

impl ParserConfig {
    pub fn strict() -> Self {
        Self {
            lenient_mode: false,
            ..Self::default()
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            language_level: LanguageLevel::default(),
            tab_size: 4,
            character_encoding: "UTF-8".to_owned(),
            store_tokens: false,
            attribute_comments: true,
            lenient_mode: true,
            collect_warnings: false,
            tolerance: 10,
            max_recovery_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Simple level (`info`, `debug`, ...) or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    /// Create the effective `EnvFilter`. `RUST_LOG`, when set, is merged in.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let config_directives = Self::normalize_level_directives(&self.level);
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let directives = match env_directives {
            Some(env) => format!("{config_directives},{env}"),
            None => config_directives,
        };
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroovyConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

impl GroovyConfig {
    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::load_from_str(&text)?;
        tracing::debug!(
            target: "groovy.config",
            path = %path.display(),
            lenient = config.parser.lenient_mode,
            "loaded config"
        );
        Ok(config)
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber for the given logging config.
///
/// Only the first call has an effect; the core crates never call this
/// themselves.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let filter = config.env_filter();
        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!(
                target: "groovy.config",
                "a global tracing subscriber was already installed"
            );
        }
    });
}

#[cfg(test)]
mod tests;
