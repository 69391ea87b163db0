//! Recursive skeleton walk.
//! Materializes the rendered tree under the destination root, one entry at a
//! time in a deterministic order.

use log::{debug, info, warn};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::binary;
use crate::error::{Error, Result};
use crate::fs::{DirEntry, EntryKind, FileSystem};
use crate::processor::{self, RenderPolicy};
use crate::renderer::TemplateRenderer;
use crate::values::ValuesContext;

/// What happened to an entry of the skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Directory created (or reused).
    Created,
    /// Text file written through the renderer.
    Rendered,
    /// File copied byte-for-byte.
    Copied,
    /// Symlink recreated.
    Linked,
    /// Destination already existed and was left untouched.
    Skipped,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Created => "Created",
            Action::Rendered => "Rendered",
            Action::Copied => "Copied",
            Action::Linked => "Linked",
            Action::Skipped => "Skipped",
        };
        write!(f, "{name}")
    }
}

/// Provenance of one produced entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub action: Action,
    /// Entry in the skeleton, relative to the source root.
    pub source: PathBuf,
    /// Produced path, absolute (under the destination root).
    pub target: PathBuf,
}

/// Everything a walk produced, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub entries: Vec<Generated>,
}

impl WalkReport {
    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|entry| entry.action == action).count()
    }

    /// Target of the entry produced from `source`, if it was produced.
    pub fn target_of<P: AsRef<Path>>(&self, source: P) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.source == source.as_ref())
            .map(|entry| entry.target.as_path())
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Joins `name` onto `parent` and checks the result stays below `boundary`.
pub fn resolve_child_path(boundary: &Path, parent: &Path, name: &str) -> Result<PathBuf> {
    let candidate = Path::new(name);
    let joined = normalize_path(&parent.join(candidate));
    let boundary = normalize_path(boundary);
    if candidate.is_absolute() || !joined.starts_with(&boundary) {
        return Err(Error::ContainmentError {
            path: parent.join(candidate).display().to_string(),
            boundary: boundary.display().to_string(),
        });
    }
    Ok(joined)
}

/// Walks a skeleton tree and writes the rendered result.
pub struct Walker<'a> {
    fs: &'a dyn FileSystem,
    renderer: &'a dyn TemplateRenderer,
    policy: &'a RenderPolicy,
    context: serde_json::Value,
    replace: bool,
}

impl<'a> Walker<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        renderer: &'a dyn TemplateRenderer,
        policy: &'a RenderPolicy,
        values: &ValuesContext,
    ) -> Self {
        let context = renderer.dialect().context(values);
        Self { fs, renderer, policy, context, replace: false }
    }

    /// Overwrite files and links that already exist in the destination.
    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    /// Renders the tree at `source_root` into `dest_root`.
    ///
    /// # Errors
    /// * `Error::FilesystemError` when an entry cannot be read or written
    /// * `Error::TemplateSyntaxError` when a name or a content fails to render
    /// * `Error::ContainmentError` when a rendered name escapes `dest_root`, or
    ///   when an entry would be written through a symlink created earlier
    ///
    /// The walk stops at the first error; entries written so far are kept.
    pub fn walk(&self, source_root: &Path, dest_root: &Path) -> Result<WalkReport> {
        debug!("Walking '{}' into '{}'", source_root.display(), dest_root.display());
        let mut report = WalkReport::default();
        self.fs.create_dir_all(dest_root).map_err(|e| Error::filesystem(dest_root, e))?;
        self.walk_dir(source_root, Path::new(""), dest_root, dest_root, &mut report)?;
        Ok(report)
    }

    fn walk_dir(
        &self,
        source_dir: &Path,
        relative_dir: &Path,
        dest_dir: &Path,
        dest_root: &Path,
        report: &mut WalkReport,
    ) -> Result<()> {
        let entries =
            self.fs.read_dir(source_dir).map_err(|e| Error::filesystem(source_dir, e))?;
        for entry in entries {
            let relative = relative_dir.join(&entry.name);
            let decision = self.policy.decide(&relative, entry.kind);

            let name = if decision.render_name {
                match processor::render_segment(self.renderer, &entry.name, &self.context)
                    .map_err(|e| e.in_template(&relative, self.renderer.dialect()))?
                {
                    Some(name) => name,
                    None => {
                        debug!("Pruning '{}'", relative.display());
                        continue;
                    }
                }
            } else {
                entry.name.clone()
            };
            let name = match &decision.strip_suffix {
                Some(suffix) => processor::strip_template_suffix(&name, suffix).to_string(),
                None => name,
            };

            let target = resolve_child_path(dest_root, dest_dir, &name)?;
            self.reject_linked_components(dest_root, &target, entry.kind == EntryKind::Dir)?;
            match entry.kind {
                EntryKind::Dir => {
                    self.fs.create_dir_all(&target).map_err(|e| Error::filesystem(&target, e))?;
                    self.record(report, Action::Created, relative.clone(), target.clone());
                    self.walk_dir(&entry.path, &relative, &target, dest_root, report)?;
                }
                EntryKind::Symlink => self.copy_symlink(&entry, relative, target, report)?,
                EntryKind::File => {
                    self.write_file(&entry, relative, target, decision.render_content, report)?
                }
            }
        }
        Ok(())
    }

    /// Fails when an existing component between `dest_root` and `target` is a
    /// symlink, which would redirect the write outside of `dest_root`.
    ///
    /// The last component is only checked for directories; an existing link
    /// in place of a file or link is handled by [`Self::keep_existing`].
    fn reject_linked_components(
        &self,
        dest_root: &Path,
        target: &Path,
        check_last: bool,
    ) -> Result<()> {
        let violation = || Error::ContainmentError {
            path: target.display().to_string(),
            boundary: dest_root.display().to_string(),
        };
        let relative = target.strip_prefix(dest_root).map_err(|_| violation())?;

        let mut current = dest_root.to_path_buf();
        let mut components = relative.components().peekable();
        while let Some(component) = components.next() {
            current.push(component);
            if components.peek().is_none() && !check_last {
                break;
            }
            match self.fs.metadata(&current) {
                Ok(metadata) if metadata.kind == EntryKind::Symlink => {
                    warn!("'{}' is a symlink, refusing to write through it", current.display());
                    return Err(violation());
                }
                Ok(_) => {}
                // nothing below a missing component exists either
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn ensure_parent(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            self.fs.create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
        }
        Ok(())
    }

    /// Returns true when the existing target must be kept as is.
    fn keep_existing(&self, target: &Path) -> Result<bool> {
        if !self.fs.exists(target) {
            return Ok(false);
        }
        if !self.replace {
            return Ok(true);
        }
        let metadata = self.fs.metadata(target).map_err(|e| Error::filesystem(target, e))?;
        if metadata.kind == EntryKind::Dir {
            return Err(Error::filesystem(
                target,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "a directory is in the way"),
            ));
        }
        self.fs.remove_file(target).map_err(|e| Error::filesystem(target, e))?;
        Ok(false)
    }

    fn copy_symlink(
        &self,
        entry: &DirEntry,
        relative: PathBuf,
        target: PathBuf,
        report: &mut WalkReport,
    ) -> Result<()> {
        let link_target =
            self.fs.read_link(&entry.path).map_err(|e| Error::filesystem(&entry.path, e))?;
        self.ensure_parent(&target)?;
        if self.keep_existing(&target)? {
            warn!("'{}' already exists, skipping", target.display());
            self.record(report, Action::Skipped, relative, target);
            return Ok(());
        }
        self.fs.symlink(&link_target, &target).map_err(|e| Error::filesystem(&target, e))?;
        self.record(report, Action::Linked, relative, target);
        Ok(())
    }

    fn write_file(
        &self,
        entry: &DirEntry,
        relative: PathBuf,
        target: PathBuf,
        render_content: bool,
        report: &mut WalkReport,
    ) -> Result<()> {
        let metadata =
            self.fs.metadata(&entry.path).map_err(|e| Error::filesystem(&entry.path, e))?;
        let content = self.fs.read(&entry.path).map_err(|e| Error::filesystem(&entry.path, e))?;

        self.ensure_parent(&target)?;
        if self.keep_existing(&target)? {
            warn!("'{}' already exists, skipping", target.display());
            self.record(report, Action::Skipped, relative, target);
            return Ok(());
        }

        let rendered = if !render_content {
            None
        } else if binary::is_binary(&relative, binary::sample(&content)) {
            debug!("'{}' looks binary, copying as is", relative.display());
            None
        } else {
            processor::render_content(self.renderer, &content, &self.context)
                .map_err(|e| e.in_template(&relative, self.renderer.dialect()))?
        };

        let action = match rendered {
            Some(rendered) => {
                self.fs.write(&target, &rendered).map_err(|e| Error::filesystem(&target, e))?;
                Action::Rendered
            }
            None => {
                self.fs.write(&target, &content).map_err(|e| Error::filesystem(&target, e))?;
                Action::Copied
            }
        };
        self.fs.set_mode(&target, metadata.mode).map_err(|e| Error::filesystem(&target, e))?;
        self.record(report, action, relative, target);
        Ok(())
    }

    fn record(&self, report: &mut WalkReport, action: Action, source: PathBuf, target: PathBuf) {
        info!("{}: '{}'", action, target.display());
        report.entries.push(Generated { action, source, target });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_resolve_child_path() {
        let root = Path::new("/out");
        assert_eq!(
            resolve_child_path(root, Path::new("/out/src"), "com/example").unwrap(),
            PathBuf::from("/out/src/com/example")
        );
        assert_eq!(
            resolve_child_path(root, Path::new("/out/src"), "..").unwrap(),
            PathBuf::from("/out")
        );
        assert!(matches!(
            resolve_child_path(root, Path::new("/out"), "../escape"),
            Err(Error::ContainmentError { .. })
        ));
        assert!(matches!(
            resolve_child_path(root, Path::new("/out"), "/etc/passwd"),
            Err(Error::ContainmentError { .. })
        ));
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Rendered.to_string(), "Rendered");
        assert_eq!(Action::Skipped.to_string(), "Skipped");
    }
}
