//! Logger configuration
//!
//! [`LoggerConfig`] is the serializable part of a logger's setup. It is applied
//! atomically with [`Logger::configure`](crate::Logger::configure): either every
//! field takes effect or none does.

use super::error::{LoggerError, Result};
use super::levels::Levels;
use crate::capture::FatalError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Level table in a config file: a preset name or an explicit table
///
/// ```json
/// { "levels": "syslog" }
/// { "levels": { "loud": 0, "quiet": 1 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelsConfig {
    Preset(String),
    Table(Levels),
}

impl LevelsConfig {
    pub fn resolve(&self) -> Result<Levels> {
        match self {
            LevelsConfig::Table(levels) => Ok(levels.clone()),
            LevelsConfig::Preset(name) => match name.as_str() {
                "npm" => Ok(Levels::npm()),
                "syslog" => Ok(Levels::syslog()),
                "cli" => Ok(Levels::cli()),
                other => Err(LoggerError::config(
                    "Levels",
                    format!("unknown preset '{}' (expected npm, syslog or cli)", other),
                )),
            },
        }
    }
}

/// Serializable logger settings
///
/// # Examples
///
/// ```
/// use logfan::LoggerConfig;
///
/// let config = LoggerConfig::from_json_str(
///     r#"{"level": "debug", "levels": "npm", "default_meta": {"service": "auth"}}"#,
/// )
/// .unwrap();
/// assert_eq!(config.level.as_deref(), Some("debug"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: Option<String>,
    pub levels: Option<LevelsConfig>,
    pub silent: Option<bool>,
    pub exit_on_error: Option<bool>,
    pub default_meta: Option<Map<String, Value>>,
}

impl LoggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve the level table and threshold against what is currently set.
    ///
    /// Fails when the resulting threshold is not part of the resulting table.
    pub(crate) fn resolve_levels(
        &self,
        current_levels: &Levels,
        current_level: &str,
    ) -> Result<(Levels, String)> {
        let levels = match &self.levels {
            Some(levels) => levels.resolve()?,
            None => current_levels.clone(),
        };
        let level = self
            .level
            .clone()
            .unwrap_or_else(|| current_level.to_string());

        if !levels.contains(&level) {
            return Err(LoggerError::config(
                "Logger",
                format!("level '{}' is not defined in levels [{}]", level, levels),
            ));
        }
        Ok((levels, level))
    }
}

/// Predicate deciding whether a fatal error ends the process
pub type ExitPredicate = Arc<dyn Fn(&FatalError) -> bool + Send + Sync>;

/// Process terminator; receives the exit status
pub type ExitHandler = Arc<dyn Fn(i32) + Send + Sync>;

/// Whether the process exits after a captured fatal error
#[derive(Clone)]
pub enum ExitOnError {
    Always(bool),
    When(ExitPredicate),
}

impl ExitOnError {
    pub fn resolve(&self, err: &FatalError) -> bool {
        match self {
            ExitOnError::Always(exit) => *exit,
            ExitOnError::When(predicate) => predicate(err),
        }
    }
}

impl Default for ExitOnError {
    fn default() -> Self {
        ExitOnError::Always(true)
    }
}

impl From<bool> for ExitOnError {
    fn from(exit: bool) -> Self {
        ExitOnError::Always(exit)
    }
}

impl fmt::Debug for ExitOnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOnError::Always(exit) => write!(f, "Always({})", exit),
            ExitOnError::When(_) => write!(f, "When(..)"),
        }
    }
}

pub(crate) fn process_exit() -> ExitHandler {
    Arc::new(|code| std::process::exit(code))
}
