//! Error handling for stencil.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::renderer::Dialect;

/// Errors that can occur while fetching and rendering a skeleton.
///
/// Every variant aborts the whole run; nothing is retried internally.
#[derive(Error, Debug)]
pub enum Error {
    /// Mutually exclusive options were supplied together, or an option is malformed.
    #[error("Configuration error: {0}.")]
    ConfigurationError(String),

    /// A resolved output path escapes the declared boundary.
    #[error("Path '{path}' resolves outside of '{boundary}'.")]
    ContainmentError { path: String, boundary: String },

    /// The template engine rejected a name or a file content.
    #[error("Failed to render '{path}' ({dialect} dialect): {source}.")]
    TemplateSyntaxError {
        path: String,
        dialect: Dialect,
        #[source]
        source: minijinja::Error,
    },

    /// The fetch collaborator failed to populate the staging directory.
    #[error("Failed to fetch '{url}': {source}.")]
    FetchError {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reading from the skeleton or writing the output tree failed.
    #[error("Filesystem error at '{path}': {source}.")]
    FilesystemError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Values file or `key=value` override could not be parsed.
    #[error("Values error: {0}.")]
    ValuesError(String),

    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Template error that has not been attributed to a path yet.
    #[error("Template error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),
}

impl Error {
    /// Wraps an io error with the path it happened at.
    pub fn filesystem<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Error::FilesystemError { path: path.as_ref().display().to_string(), source }
    }

    /// Attributes a rendering failure to the relative path being processed.
    ///
    /// Errors that did not come from the template engine are returned unchanged.
    pub fn in_template<P: AsRef<Path>>(self, path: P, dialect: Dialect) -> Self {
        match self {
            Error::MinijinjaError(source) => Error::TemplateSyntaxError {
                path: path.as_ref().display().to_string(),
                dialect,
                source,
            },
            other => other,
        }
    }
}

/// Convenience type alias for Results with stencil's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
