//! Glob patterns selecting skeleton entries that must not be rendered.
//! Patterns are relative to the skeleton root, similar to .gitignore lines.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::Path;

use crate::error::{Error, Result};

/// Compiled set of path patterns.
///
/// A path matches when the path itself or any of its ancestors matches one of
/// the patterns, so naming a directory covers everything beneath it.
#[derive(Debug, Clone)]
pub struct PathPatterns {
    patterns: Vec<String>,
    glob_set: GlobSet,
}

impl PathPatterns {
    /// Compiles the given patterns.
    ///
    /// # Notes
    /// - `*` does not cross directory separators, `**` does
    /// - a leading `./` and trailing `/` are ignored
    /// - invalid patterns result in a `ConfigurationError`
    ///
    /// # Example
    /// ```
    /// use stencil::patterns::PathPatterns;
    ///
    /// let patterns = PathPatterns::new(&[".github/", "**/*.png"]).unwrap();
    /// assert!(patterns.is_match(".github/workflows/ci.yml"));
    /// assert!(patterns.is_match("assets/logo.png"));
    /// ```
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut normalized = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = normalize(pattern.as_ref());
            if pattern.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(&pattern).literal_separator(true).build().map_err(|e| {
                Error::ConfigurationError(format!("invalid pattern '{pattern}': {e}"))
            })?;
            builder.add(glob);
            normalized.push(pattern);
        }
        let glob_set = builder
            .build()
            .map_err(|e| Error::ConfigurationError(format!("invalid patterns: {e}")))?;
        debug!("Compiled {} path patterns", normalized.len());

        Ok(Self { patterns: normalized, glob_set })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Checks `path` (relative to the skeleton root) and its ancestors.
    pub fn is_match<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref()
            .ancestors()
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .any(|ancestor| self.glob_set.is_match(ancestor))
    }
}

fn normalize(pattern: &str) -> String {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.trim_end_matches('/').to_string()
}
