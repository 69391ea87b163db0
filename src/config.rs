//! Input handling for a template run.
//! This module deserializes the run input (from JSON, YAML or the command
//! line) and validates it into [`TemplateOptions`].

use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::constants::DEFAULT_TARGET_PATH;
use crate::error::{Error, Result};
use crate::patterns::PathPatterns;
use crate::processor::{RenderPolicy, TemplateExtension};
use crate::renderer::Dialect;
use crate::values::ValuesContext;

/// `templateFileExtension` accepts either a flag or a suffix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TemplateFileExtension {
    Enabled(bool),
    Suffix(String),
}

fn default_target_path() -> String {
    DEFAULT_TARGET_PATH.to_string()
}

/// Raw input of a template run, as supplied by the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FetchTemplateInput {
    /// Location of the skeleton, resolved against the base URL.
    #[serde(default)]
    pub url: String,
    /// Output directory, relative to the workspace.
    #[serde(default = "default_target_path")]
    pub target_path: String,
    #[serde(default)]
    pub values: ValuesContext,
    pub copy_without_render: Option<Vec<String>>,
    pub copy_without_templating: Option<Vec<String>>,
    pub template_file_extension: Option<TemplateFileExtension>,
    #[serde(default)]
    pub cookiecutter_compat: bool,
    /// Overwrite files that already exist in the target directory.
    #[serde(default)]
    pub replace: bool,
}

impl FetchTemplateInput {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self { url: url.into(), target_path: default_target_path(), ..Default::default() }
    }

    /// Parses an input document, trying JSON first and YAML second.
    pub fn parse(content: &str) -> Result<Self> {
        match serde_json::from_str(content) {
            Ok(input) => Ok(input),
            Err(_) => serde_yaml::from_str(content).map_err(|e| {
                Error::ConfigurationError(format!("invalid input document: {e}"))
            }),
        }
    }

    /// Loads an input document from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading input from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
        Self::parse(&content)
    }
}

/// Validated configuration of a run.
#[derive(Debug, Clone)]
pub struct TemplateOptions {
    pub url: String,
    pub target_path: String,
    pub values: ValuesContext,
    pub dialect: Dialect,
    pub policy: RenderPolicy,
    pub replace: bool,
}

impl TryFrom<FetchTemplateInput> for TemplateOptions {
    type Error = Error;

    /// Validates the option combination.
    ///
    /// # Errors
    /// * `Error::ConfigurationError` if
    ///   - both skip lists are given
    ///   - a template file extension is combined with a skip list or with cookiecutter compat
    ///   - the url is empty or a pattern does not compile
    fn try_from(input: FetchTemplateInput) -> Result<Self> {
        if input.url.trim().is_empty() {
            return Err(Error::ConfigurationError("url must not be empty".to_string()));
        }

        let extension = match input.template_file_extension {
            None | Some(TemplateFileExtension::Enabled(false)) => None,
            Some(TemplateFileExtension::Enabled(true)) => Some(TemplateExtension::Implicit),
            Some(TemplateFileExtension::Suffix(suffix)) => {
                let suffix = suffix.trim();
                if suffix.is_empty() || suffix == "." {
                    return Err(Error::ConfigurationError(
                        "templateFileExtension must not be empty".to_string(),
                    ));
                }
                Some(TemplateExtension::explicit(suffix))
            }
        };

        if extension.is_some()
            && (input.copy_without_render.is_some()
                || input.copy_without_templating.is_some()
                || input.cookiecutter_compat)
        {
            return Err(Error::ConfigurationError(
                "templateFileExtension cannot be combined with copyWithoutRender, \
                 copyWithoutTemplating or cookiecutterCompat"
                    .to_string(),
            ));
        }

        let policy = match (input.copy_without_render, input.copy_without_templating, extension) {
            (Some(_), Some(_), _) => {
                return Err(Error::ConfigurationError(
                    "copyWithoutRender and copyWithoutTemplating cannot be used together"
                        .to_string(),
                ))
            }
            (Some(patterns), None, _) => {
                RenderPolicy::CopyWithoutRender(PathPatterns::new(&patterns)?)
            }
            (None, Some(patterns), _) => {
                RenderPolicy::CopyWithoutTemplating(PathPatterns::new(&patterns)?)
            }
            (None, None, Some(extension)) => RenderPolicy::TemplateExtension(extension),
            (None, None, None) => RenderPolicy::RenderAll,
        };

        let dialect = if input.cookiecutter_compat { Dialect::Compat } else { Dialect::Default };

        Ok(Self {
            url: input.url,
            target_path: input.target_path,
            values: input.values,
            dialect,
            policy,
            replace: input.replace,
        })
    }
}
