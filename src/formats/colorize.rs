//! Terminal colors for the visible level

use crate::core::error::Result;
use crate::core::format::Format;
use crate::core::record::LogRecord;
use colored::{Color, Colorize as _};
use std::collections::HashMap;

/// Wraps the `level` field (and optionally the message) in ANSI colors.
///
/// Routing is unaffected: the engine remembers the original level name.
/// Levels without a configured color are left as they are.
///
/// # Examples
///
/// ```
/// use logfan::formats::{Colorize, Simple};
/// use logfan::Pipeline;
/// use colored::Color;
///
/// let pipeline = Pipeline::new()
///     .stage(Colorize::new().with_color("notice", Color::BrightBlue))
///     .stage(Simple::new());
/// assert_eq!(pipeline.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Colorize {
    colors: HashMap<String, Color>,
    message: bool,
}

impl Colorize {
    /// npm and syslog level names preloaded
    pub fn new() -> Self {
        let colors = [
            ("emerg", Color::Red),
            ("alert", Color::Red),
            ("crit", Color::Red),
            ("error", Color::Red),
            ("warning", Color::Yellow),
            ("warn", Color::Yellow),
            ("notice", Color::Blue),
            ("info", Color::Green),
            ("http", Color::Green),
            ("verbose", Color::Cyan),
            ("debug", Color::Blue),
            ("silly", Color::Magenta),
        ]
        .into_iter()
        .map(|(name, color)| (name.to_string(), color))
        .collect();
        Self {
            colors,
            message: false,
        }
    }

    #[must_use]
    pub fn with_color(mut self, level: impl Into<String>, color: Color) -> Self {
        self.colors.insert(level.into(), color);
        self
    }

    /// Color the message as well as the level
    #[must_use]
    pub fn all(mut self) -> Self {
        self.message = true;
        self
    }
}

impl Default for Colorize {
    fn default() -> Self {
        Self::new()
    }
}

impl Format for Colorize {
    fn transform(&self, mut record: LogRecord) -> Result<Option<LogRecord>> {
        let Some(color) = record
            .routing_level()
            .and_then(|level| self.colors.get(level))
            .copied()
        else {
            return Ok(Some(record));
        };

        if let Some(level) = record.level().map(str::to_string) {
            record.insert("level", level.color(color).to_string());
        }
        if self.message {
            let message = record.message_text().color(color).to_string();
            record.insert("message", message);
        }
        Ok(Some(record))
    }

    fn name(&self) -> &str {
        "colorize"
    }
}
