//! Template action orchestration.
//! Validates the input, fetches the skeleton into a staging directory and
//! walks it into the target path.

use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::config::{FetchTemplateInput, TemplateOptions};
use crate::constants::STAGING_PREFIX;
use crate::error::{Error, Result};
use crate::fetch::{ContentFetcher, DefaultFetcher, FetchRequest};
use crate::fs::DiskFs;
use crate::renderer::MiniJinjaRenderer;
use crate::walker::{normalize_path, WalkReport, Walker};

/// Resolves `target` relative to `boundary` and makes sure it stays inside.
///
/// `boundary` is made absolute first, so a relative workspace such as `.`
/// is checked against the current directory. The check is lexical first;
/// then both paths are compared by their real location, so a symlink inside
/// the workspace cannot redirect the output elsewhere.
///
/// # Errors
/// * `Error::ContainmentError` if the target resolves outside of `boundary`
/// * `Error::FilesystemError` if an existing component cannot be resolved
pub fn resolve_safe_child_path<P: AsRef<Path>, T: AsRef<Path>>(
    boundary: P,
    target: T,
) -> Result<PathBuf> {
    let boundary = boundary.as_ref();
    let boundary =
        normalize_path(&std::path::absolute(boundary).map_err(|e| Error::filesystem(boundary, e))?);
    let resolved = normalize_path(&boundary.join(target.as_ref()));
    let violation = || Error::ContainmentError {
        path: target.as_ref().display().to_string(),
        boundary: boundary.display().to_string(),
    };

    if !resolved.starts_with(&boundary) {
        return Err(violation());
    }
    if !real_path(&resolved)?.starts_with(real_path(&boundary)?) {
        return Err(violation());
    }

    Ok(resolved)
}

/// Canonicalizes the deepest ancestor of `path` that exists (a dangling
/// symlink counts as existing) and appends the remaining components.
fn real_path(path: &Path) -> Result<PathBuf> {
    for ancestor in path.ancestors() {
        if std::fs::symlink_metadata(ancestor).is_err() {
            continue;
        }
        let real = ancestor.canonicalize().map_err(|e| Error::filesystem(ancestor, e))?;
        return Ok(match path.strip_prefix(ancestor) {
            Ok(rest) => real.join(rest),
            Err(_) => real,
        });
    }
    Ok(path.to_path_buf())
}

/// Fetches a skeleton and renders it into the workspace.
pub struct FetchTemplateAction {
    workspace_path: PathBuf,
    base_url: Option<String>,
    fetcher: Box<dyn ContentFetcher>,
}

impl FetchTemplateAction {
    /// Creates an action writing below `workspace_path`, using [`DefaultFetcher`].
    pub fn new<P: Into<PathBuf>>(workspace_path: P) -> Self {
        Self {
            workspace_path: workspace_path.into(),
            base_url: None,
            fetcher: Box::new(DefaultFetcher),
        }
    }

    /// Location relative `url` inputs are resolved against.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn ContentFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Runs the action.
    ///
    /// # Flow
    /// 1. Validates the option combination
    /// 2. Resolves the target path inside the workspace
    /// 3. Fetches the skeleton into a fresh staging directory
    /// 4. Walks the staged skeleton into the target path
    ///
    /// Nothing is written to the workspace before steps 1 and 2 succeed. The
    /// staging directory is removed when the run ends, successful or not.
    pub fn run(&self, input: FetchTemplateInput) -> Result<WalkReport> {
        let options = TemplateOptions::try_from(input)?;
        let target = resolve_safe_child_path(&self.workspace_path, &options.target_path)?;
        let renderer = MiniJinjaRenderer::new(options.dialect)?;

        let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
        let template_dir = staging.path().join("template");
        debug!("Staging '{}' in '{}'", options.url, template_dir.display());

        self.fetcher.fetch_contents(&FetchRequest {
            base_url: self.base_url.clone(),
            fetch_url: options.url.clone(),
            output_path: template_dir.clone(),
        })?;

        let disk = DiskFs::new();
        let report = Walker::new(&disk, &renderer, &options.policy, &options.values)
            .replace(options.replace)
            .walk(&template_dir, &target)?;

        info!(
            "Processed {} entries from '{}' into '{}'",
            report.entries.len(),
            options.url,
            target.display()
        );
        Ok(report)
    }
}
