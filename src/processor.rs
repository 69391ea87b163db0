//! Per-entry rendering decisions.
//!
//! Names are rendered one path segment at a time, a segment that renders
//! to nothing prunes the entry together with everything beneath it. Content
//! rendering follows the [`RenderPolicy`] chosen for the run.

use log::debug;
use std::path::Path;

use crate::constants::DEFAULT_TEMPLATE_EXTENSIONS;
use crate::error::Result;
use crate::fs::EntryKind;
use crate::patterns::PathPatterns;
use crate::renderer::TemplateRenderer;

/// Which files are rendered when template file extensions are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateExtension {
    /// Any of the default marker suffixes (`.njk`, `.j2`).
    Implicit,
    /// Exactly this suffix, including the leading dot.
    Explicit(String),
}

impl TemplateExtension {
    /// Builds an explicit extension, adding the leading dot if missing.
    pub fn explicit<S: AsRef<str>>(suffix: S) -> Self {
        let suffix = suffix.as_ref();
        if suffix.starts_with('.') {
            Self::Explicit(suffix.to_string())
        } else {
            Self::Explicit(format!(".{suffix}"))
        }
    }

    pub fn suffixes(&self) -> Vec<&str> {
        match self {
            Self::Implicit => DEFAULT_TEMPLATE_EXTENSIONS.to_vec(),
            Self::Explicit(suffix) => vec![suffix.as_str()],
        }
    }

    /// Suffix `name` is marked with, if any. A bare suffix is not a template.
    pub fn matched_suffix(&self, name: &str) -> Option<&str> {
        self.suffixes()
            .into_iter()
            .find(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
    }
}

/// How names and contents are treated for a whole run.
#[derive(Debug, Clone)]
pub enum RenderPolicy {
    /// Render every name and every text file.
    RenderAll,
    /// Matched entries are copied as-is, names included.
    CopyWithoutRender(PathPatterns),
    /// Matched entries get their names rendered but contents copied as-is.
    CopyWithoutTemplating(PathPatterns),
    /// Only files carrying the template suffix are rendered; the suffix is stripped.
    TemplateExtension(TemplateExtension),
}

/// Outcome of [`RenderPolicy::decide`] for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderDecision {
    pub render_name: bool,
    pub render_content: bool,
    /// Suffix to remove from the rendered name.
    pub strip_suffix: Option<String>,
}

impl RenderDecision {
    fn new(render_name: bool, render_content: bool) -> Self {
        Self { render_name, render_content, strip_suffix: None }
    }
}

impl RenderPolicy {
    /// Decides how the entry at `relative_path` is treated.
    ///
    /// The binary check is applied on top of this by the walker, binary files
    /// are never content-rendered whatever the decision says.
    pub fn decide(&self, relative_path: &Path, kind: EntryKind) -> RenderDecision {
        match self {
            Self::CopyWithoutRender(patterns) if patterns.is_match(relative_path) => {
                RenderDecision::new(false, false)
            }
            Self::CopyWithoutTemplating(patterns) if patterns.is_match(relative_path) => {
                RenderDecision::new(true, false)
            }
            Self::TemplateExtension(extension) => {
                let name = relative_path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                match extension.matched_suffix(name) {
                    Some(suffix) if kind == EntryKind::File => RenderDecision {
                        render_name: true,
                        render_content: true,
                        strip_suffix: Some(suffix.to_string()),
                    },
                    _ => RenderDecision::new(true, false),
                }
            }
            _ => RenderDecision::new(true, true),
        }
    }

    /// Whether the content of the file at `relative_path` goes through the renderer.
    pub fn should_render_content(&self, relative_path: &Path) -> bool {
        self.decide(relative_path, EntryKind::File).render_content
    }
}

/// Renders a single path segment.
///
/// Returns `None` when the segment is pruned: it rendered to an empty (or
/// whitespace only) string, or to something with empty components such as
/// `a//b` or a trailing `/`.
pub fn render_segment(
    renderer: &dyn TemplateRenderer,
    segment: &str,
    context: &serde_json::Value,
) -> Result<Option<String>> {
    let rendered = renderer.render(segment, context)?;
    if !is_rendered_name_valid(&rendered) {
        debug!("Segment '{segment}' rendered to '{rendered}', pruning");
        return Ok(None);
    }
    Ok(Some(rendered))
}

/// Checks that a rendered name can be used as (a chain of) path components.
pub fn is_rendered_name_valid(rendered: &str) -> bool {
    !rendered.trim().is_empty() && rendered.split('/').all(|component| !component.is_empty())
}

/// Removes the template suffix from an already rendered name.
pub fn strip_template_suffix<'a>(rendered: &'a str, suffix: &str) -> &'a str {
    match rendered.strip_suffix(suffix) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => rendered,
    }
}

/// Renders file content.
///
/// Returns `None` when the bytes are not valid UTF-8; such files are copied
/// as-is by the caller.
pub fn render_content(
    renderer: &dyn TemplateRenderer,
    content: &[u8],
    context: &serde_json::Value,
) -> Result<Option<Vec<u8>>> {
    let Ok(text) = std::str::from_utf8(content) else {
        return Ok(None);
    };
    let rendered = renderer.render(text, context)?;
    Ok(Some(rendered.into_bytes()))
}
