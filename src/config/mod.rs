//! Configuration module for relq.
//!
//! Handles the `relq.toml` file, environment variable expansion, and the
//! mapping onto compiler options.

mod settings;

pub use settings::{
    expand_env_vars, CompilerSettings, LoggingSettings, QuerySettings, Settings, SettingsError,
};
