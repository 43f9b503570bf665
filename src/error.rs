//! Error handling for widgets-rs
//!
//! Every failure in the core is a programmer or configuration defect, so
//! errors are raised where they are detected and propagated to the caller.
//! Nothing is retried.

use thiserror::Error;

/// Main error type for widgets-rs operations
#[derive(Error, Debug)]
pub enum WidgetError {
    /// Malformed construction input: empty id, duplicate sibling ids,
    /// non-resource children, values failing the codec, bad compressed text
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Valid construction but invalid runtime access: missing attribute,
    /// missing path segment, ambiguous flatten
    #[error("Node execution error: {0}")]
    NodeExecution(String),

    /// Generation-time failures: un-encodable values, reserved delimiters
    #[error("Compiler error: {0}")]
    Compiler(String),

    /// Failures surfaced by the program loader and other outer collaborators
    #[error("Load error: {0}")]
    Collaborator(String),

    /// Errors related to Rhai hook compilation or execution
    #[error("Script error: {0}")]
    Script(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<WidgetError>,
    },
}

/// Coarse classification of a [`WidgetError`], looking through context wrappers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NodeExecution,
    Compiler,
    Collaborator,
    Script,
    Io,
    Serialization,
}

impl WidgetError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        WidgetError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        WidgetError::Script(err.to_string())
    }

    /// The kind of the innermost error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WidgetError::Configuration(_) => ErrorKind::Configuration,
            WidgetError::NodeExecution(_) => ErrorKind::NodeExecution,
            WidgetError::Compiler(_) => ErrorKind::Compiler,
            WidgetError::Collaborator(_) => ErrorKind::Collaborator,
            WidgetError::Script(_) => ErrorKind::Script,
            WidgetError::Io(_) => ErrorKind::Io,
            WidgetError::Serialization(_) => ErrorKind::Serialization,
            WidgetError::WithContext { source, .. } => source.kind(),
        }
    }
}

/// Result type alias for widgets-rs operations
pub type Result<T> = std::result::Result<T, WidgetError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| WidgetError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| WidgetError::from_rhai_error(e).with_context(f()))
    }
}
