//! Command-line interface implementation for stencil.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::{FetchTemplateInput, TemplateFileExtension};
use crate::error::{Error, Result};
use crate::values::ValuesContext;

/// Command-line arguments structure for stencil.
#[derive(Parser, Debug)]
#[command(author, version, about = "stencil: render a skeleton directory into a new project", long_about = None)]
pub struct Args {
    /// Skeleton location: local path, file:// URL or git repository URL
    #[arg(value_name = "URL", required_unless_present = "input")]
    pub url: Option<String>,

    /// Output directory, relative to the workspace
    #[arg(value_name = "TARGET_PATH")]
    pub target_path: Option<String>,

    /// Directory outside of which nothing is written
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Location relative skeleton URLs are resolved against
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// JSON or YAML document with the run input; flags override its fields
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// JSON or YAML file with template values
    #[arg(long, value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Set a single value, dotted keys create nested values
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Copy matching entries without rendering names or contents
    #[arg(long, value_name = "GLOB")]
    pub copy_without_render: Vec<String>,

    /// Copy matching entries without rendering contents; names are still rendered
    #[arg(long, value_name = "GLOB")]
    pub copy_without_templating: Vec<String>,

    /// Only render files with this suffix (default suffixes when no value is given)
    #[arg(long, value_name = "EXT", num_args = 0..=1, default_missing_value = "")]
    pub template_file_extension: Option<String>,

    /// Use cookiecutter compatible `{{ cookiecutter.x }}` templates
    #[arg(long)]
    pub cookiecutter_compat: bool,

    /// Overwrite files that already exist in the target directory
    #[arg(short, long)]
    pub replace: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Builds the run input from the input document (if any) and the flags.
    ///
    /// # Errors
    /// * `Error::ConfigurationError` if no skeleton URL is given
    /// * `Error::ValuesError` if a values file or `--set` pair is malformed
    pub fn to_input(&self) -> Result<FetchTemplateInput> {
        let mut input = match &self.input {
            Some(path) => FetchTemplateInput::from_file(path)?,
            None => FetchTemplateInput::new(""),
        };

        if let Some(url) = &self.url {
            input.url = url.clone();
        }
        if input.url.is_empty() {
            return Err(Error::ConfigurationError(
                "no skeleton URL given on the command line or in the input document".to_string(),
            ));
        }
        if let Some(target_path) = &self.target_path {
            input.target_path = target_path.clone();
        }

        if let Some(path) = &self.values {
            input.values.merge(ValuesContext::from_file(path)?);
        }
        for pair in &self.set {
            input.values.set_pair(pair)?;
        }

        if !self.copy_without_render.is_empty() {
            input.copy_without_render = Some(self.copy_without_render.clone());
        }
        if !self.copy_without_templating.is_empty() {
            input.copy_without_templating = Some(self.copy_without_templating.clone());
        }
        match self.template_file_extension.as_deref() {
            None => {}
            Some("") => {
                input.template_file_extension = Some(TemplateFileExtension::Enabled(true))
            }
            Some(suffix) => {
                input.template_file_extension =
                    Some(TemplateFileExtension::Suffix(suffix.to_string()))
            }
        }
        input.cookiecutter_compat |= self.cookiecutter_compat;
        input.replace |= self.replace;

        Ok(input)
    }
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let mut command = Args::command().help_template(
                    r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                );
                if let Err(err) = command.print_help() {
                    eprintln!("{err}");
                }
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
