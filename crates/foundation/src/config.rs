//! Per-environment configuration loaded from TOML.
//!
//! ```toml
//! [default.database.db]
//! path = "${DATA_DIR}/app.sqlite"
//!
//! [dev.database.db]
//! path = ":memory:"
//! debug = "stack"
//! slow_query_ms = 50
//! ```
//!
//! Lookups try the current environment first and fall back to `default`.

use crate::error::{OrmError, OrmResult};
use crate::monitor::{DebugLevel, MonitorConfig};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Environment variable selecting the current environment.
pub const ENVIRONMENT_VAR: &str = "FOUNDATION_ENV";

/// Environment every lookup falls back to.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Identifier of the database used when none is named.
pub const DEFAULT_DATABASE: &str = "db";

/// Settings for one environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub database: BTreeMap<String, DatabaseConfig>,
}

/// Connection settings for one database.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Database file, or `:memory:`.
    pub path: String,
    /// Log every statement at this level.
    #[serde(default)]
    pub debug: Option<DebugLevel>,
    /// Report statements slower than this many milliseconds.
    #[serde(default)]
    pub slow_query_ms: Option<u64>,
}

impl DatabaseConfig {
    /// Monitoring is enabled when a slow query threshold is configured.
    pub fn monitor_config(&self) -> MonitorConfig {
        match self.slow_query_ms {
            Some(ms) => MonitorConfig::new()
                .with_slow_query_threshold(Duration::from_millis(ms))
                .enable_monitoring(),
            None => MonitorConfig::new(),
        }
    }

    /// Open the database with the configured debug hook and monitor.
    #[cfg(feature = "sqlite")]
    pub fn connect(
        &self,
    ) -> OrmResult<crate::monitor::InstrumentedConnection<crate::sqlite::SqliteConnection>> {
        use crate::monitor::{InstrumentedConnection, LoggingMonitor, SqlDebugHook};
        use crate::sqlite::SqliteConnection;

        let conn = if self.path == ":memory:" {
            SqliteConnection::open_in_memory()?
        } else {
            SqliteConnection::open(&self.path)?
        };
        tracing::debug!(target: "foundation.sql", path = %self.path, "database opened");

        let mut conn = InstrumentedConnection::new(conn)
            .with_config(self.monitor_config())
            .with_monitor(LoggingMonitor::new());
        if let Some(level) = self.debug {
            conn = conn.with_hook(SqlDebugHook::new(level));
        }
        Ok(conn)
    }

    fn expand_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> OrmResult<()> {
        self.path = expand_env_vars(&self.path, lookup)?;
        Ok(())
    }
}

/// Configuration for every environment, with one of them selected.
#[derive(Debug, Clone)]
pub struct FoundationConfig {
    environment: String,
    environments: BTreeMap<String, EnvironmentConfig>,
}

impl FoundationConfig {
    /// Load a file, selecting the environment named by `FOUNDATION_ENV`.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text, expanding `${VAR}` from the process environment.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        Self::from_toml_str_with(raw, |key| std::env::var(key).ok())
    }

    /// Parse TOML text, resolving `${VAR}` through `lookup`.
    pub fn from_toml_str_with(
        raw: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> OrmResult<Self> {
        let mut environments: BTreeMap<String, EnvironmentConfig> = toml::from_str(raw)?;
        for env in environments.values_mut() {
            for db in env.database.values_mut() {
                db.expand_env(&lookup)?;
            }
        }

        let environment = std::env::var(ENVIRONMENT_VAR)
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        tracing::debug!(target: "foundation.config", environment = %environment, "configuration loaded");

        Ok(Self {
            environment,
            environments,
        })
    }

    /// Select the current environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Names of the environments present in the file.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Settings for database `id`, from the current environment or `default`.
    pub fn database(&self, id: &str) -> OrmResult<&DatabaseConfig> {
        [self.environment.as_str(), DEFAULT_ENVIRONMENT]
            .into_iter()
            .find_map(|env| self.environments.get(env)?.database.get(id))
            .ok_or_else(|| {
                OrmError::config(format!(
                    "no database '{id}' in environment '{}' or '{DEFAULT_ENVIRONMENT}'",
                    self.environment
                ))
            })
    }

    /// Settings for the `db` database.
    pub fn default_database(&self) -> OrmResult<&DatabaseConfig> {
        self.database(DEFAULT_DATABASE)
    }
}

/// Replace every `${VAR}` in `input` with the value from `lookup`.
fn expand_env_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> OrmResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(OrmError::config(format!(
                    "unterminated env var reference: ${{{key}"
                )));
            }
            if key.is_empty() {
                return Err(OrmError::config("invalid env var reference: ${}"));
            }

            let value = lookup(&key).ok_or_else(|| {
                OrmError::config(format!("missing env var for config expansion: {key}"))
            })?;
            out.push_str(&value);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
