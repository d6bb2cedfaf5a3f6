//! Format pipeline contract
//!
//! A format is a synchronous record transformer run once per record before
//! fan-out. Returning `Ok(None)` drops the record.

use super::error::Result;
use super::record::LogRecord;
use std::fmt;
use std::sync::Arc;

pub trait Format: Send + Sync {
    fn transform(&self, record: LogRecord) -> Result<Option<LogRecord>>;

    /// Name used in pipeline error messages
    fn name(&self) -> &str {
        "format"
    }
}

impl<F: Format + ?Sized> Format for Arc<F> {
    fn transform(&self, record: LogRecord) -> Result<Option<LogRecord>> {
        (**self).transform(record)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Chain of formats applied in order; stops at the first stage that drops
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Format>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    #[must_use]
    pub fn stage<F: Format + 'static>(mut self, format: F) -> Self {
        self.stages.push(Arc::new(format));
        self
    }

    pub fn push(&mut self, format: Arc<dyn Format>) {
        self.stages.push(format);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Format for Pipeline {
    fn transform(&self, record: LogRecord) -> Result<Option<LogRecord>> {
        let mut current = record;
        for stage in &self.stages {
            match stage.transform(current)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    fn name(&self) -> &str {
        "pipeline"
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

/// A format backed by a closure
pub struct FnFormat<F> {
    name: String,
    f: F,
}

impl<F> Format for FnFormat<F>
where
    F: Fn(LogRecord) -> Result<Option<LogRecord>> + Send + Sync,
{
    fn transform(&self, record: LogRecord) -> Result<Option<LogRecord>> {
        (self.f)(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a closure as a named [`Format`]
///
/// # Examples
///
/// ```
/// use logfan::{format_fn, Format, LogRecord};
///
/// let shout = format_fn("shout", |mut record: LogRecord| {
///     let text = record.message_text().to_uppercase();
///     record.insert("message", text);
///     Ok(Some(record))
/// });
///
/// let out = shout.transform(LogRecord::new("info", "hi")).unwrap().unwrap();
/// assert_eq!(out.message_text(), "HI");
/// ```
pub fn format_fn<F>(name: impl Into<String>, f: F) -> FnFormat<F>
where
    F: Fn(LogRecord) -> Result<Option<LogRecord>> + Send + Sync,
{
    FnFormat {
        name: name.into(),
        f,
    }
}
