//! Error handling for subflow-rs
//!
//! This module defines the application-level error type and a Result alias.
//! The pipeline engine has its own [`PipelineError`](crate::pipeline::PipelineError)
//! which converts into [`SubflowError`] at the application boundary.

use crate::pipeline::PipelineError;
use thiserror::Error;

/// Main error type for subflow-rs operations
#[derive(Error, Debug)]
pub enum SubflowError {
    /// Errors raised while building or running a pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Errors related to Rhai script execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

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
        source: Box<SubflowError>,
    },
}

impl SubflowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        SubflowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        SubflowError::Script(err.to_string())
    }

    /// True if this error (or any wrapped source) is a cooperative cancellation
    pub fn is_cancellation(&self) -> bool {
        match self {
            SubflowError::Pipeline(e) => e.is_cancellation(),
            SubflowError::WithContext { source, .. } => source.is_cancellation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for SubflowError {
    fn from(err: serde_json::Error) -> Self {
        SubflowError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SubflowError {
    fn from(err: toml::de::Error) -> Self {
        SubflowError::Config(err.to_string())
    }
}

/// Result type alias for subflow-rs operations
pub type Result<T> = std::result::Result<T, SubflowError>;

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

impl<T> ResultExt<T> for std::result::Result<T, PipelineError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SubflowError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SubflowError::from(e).with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| SubflowError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| SubflowError::from_rhai_error(e).with_context(f()))
    }
}
