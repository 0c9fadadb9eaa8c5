//! TOML-based configuration for relq.
//!
//! Supports a config file (relq.toml) with environment variable expansion
//! in every string value.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! dialect = "${RELQ_DIALECT}"
//! alias_style = "sequential"
//! alias_length = 5
//!
//! [query]
//! default_limit = 100
//! max_limit = -1
//!
//! [logging]
//! level = "relq=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::compiler::{AliasStyle, CompilerOptions};
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,
    pub query: QuerySettings,
    pub logging: LoggingSettings,
}

/// SQL generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Target dialect (postgres, mysql, mssql, sqlite, duckdb).
    pub dialect: Dialect,

    /// `random` or `sequential` join aliases.
    pub alias_style: AliasStyle,

    /// Length of random aliases.
    pub alias_length: usize,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            alias_style: AliasStyle::default(),
            alias_length: 5,
        }
    }
}

/// Pagination defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Limit applied when a request has none (`-1` = unlimited).
    pub default_limit: i64,

    /// Cap on any limit (`-1` = no cap).
    pub max_limit: i64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: -1,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RELQ_CONFIG`
    /// 2. `./relq.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn discover() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RELQ_CONFIG") {
            return Self::load(&path);
        }

        let local_config = PathBuf::from("relq.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Settings::default())
    }

    /// Check value ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=32).contains(&self.compiler.alias_length) {
            return Err(SettingsError::InvalidConfig(format!(
                "compiler.alias_length must be between 1 and 32, got {}",
                self.compiler.alias_length
            )));
        }
        for (name, value) in [
            ("query.default_limit", self.query.default_limit),
            ("query.max_limit", self.query.max_limit),
        ] {
            if value < -1 {
                return Err(SettingsError::InvalidConfig(format!(
                    "{} must be -1 or a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Compiler options derived from these settings.
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            dialect: self.compiler.dialect,
            alias_style: self.compiler.alias_style,
            alias_length: self.compiler.alias_length,
            default_limit: self.query.default_limit,
            max_limit: self.query.max_limit,
        }
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    /// Parse TOML, expanding `${VAR}` in string values before typing them.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut value = toml::Value::Table(toml::from_str::<toml::Table>(content)?);
        expand_value(&mut value)?;
        let settings: Settings = value.try_into()?;
        settings.validate()?;
        Ok(settings)
    }
}

fn expand_value(value: &mut toml::Value) -> Result<(), SettingsError> {
    match value {
        toml::Value::String(s) => *s = expand_env_vars(s)?,
        toml::Value::Array(items) => {
            for item in items {
                expand_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_value(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
