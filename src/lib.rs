//! stencil renders a skeleton directory tree into a new project.
//! File and directory names and text file contents go through a template
//! engine; binary files, symlinks and permission bits are carried over as-is.

/// Fetch, validate and walk orchestration
pub mod action;

/// Binary file detection
pub mod binary;

/// Command-line interface module for the stencil application
pub mod cli;

/// Run input parsing and validation
/// Supports JSON and YAML input documents
pub mod config;

/// Common constants
pub mod constants;

/// Error types and handling for the stencil application
pub mod error;

/// Skeleton retrieval into the staging directory
/// Handles local directories and git repositories
pub mod fetch;

/// Custom template filters
pub mod filters;

/// File tree capability (disk and in-memory)
pub mod fs;

/// Logger setup for the binary
pub mod logger;

/// Glob patterns for the copy-without-render lists
pub mod patterns;

/// Per-entry name and content rendering decisions
pub mod processor;

/// Template rendering with the default and cookiecutter dialects
pub mod renderer;

/// Template values
pub mod values;

/// Recursive skeleton walk
pub mod walker;
