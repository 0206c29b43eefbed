//! Template loading and rendering
//!
//! Templates are Jinja-style text files named after the lowercased weekday
//! (`templates/monday`). Rendering is lenient: an undefined variable renders
//! as an empty string, and text without variables comes back unchanged,
//! trailing newline included.

use std::io::ErrorKind;
use std::path::PathBuf;

use minijinja::{Environment, UndefinedBehavior};
use tracing::{debug, instrument};

use crate::context::Context;
use crate::{Result, SchedulerError};

/// Source of template text, keyed by weekday name
pub trait TemplateStore: Send + Sync {
    /// Load the template for `day`; absence is [`SchedulerError::TemplateNotFound`]
    fn load(&self, day: &str) -> Result<String>;
}

/// Renders template text with a context
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, context: &Context) -> Result<String>;
}

/// Templates stored as one file per day in a directory
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    directory: PathBuf,
}

impl FileTemplateStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path_for(&self, day: &str) -> PathBuf {
        self.directory.join(day.trim().to_lowercase())
    }
}

impl TemplateStore for FileTemplateStore {
    #[instrument(skip(self))]
    fn load(&self, day: &str) -> Result<String> {
        let path = self.path_for(day);
        debug!("Reading template {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SchedulerError::TemplateNotFound {
                day: day.to_string(),
                path: path.display().to_string(),
            },
            _ => SchedulerError::from(e),
        })
    }
}

/// Jinja-compatible renderer backed by minijinja
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.set_keep_trailing_newline(true);
        Self { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for JinjaRenderer {
    fn render(&self, template: &str, context: &Context) -> Result<String> {
        self.env
            .render_str(template, context)
            .map_err(|e| SchedulerError::template(e.to_string()))
    }
}
