//! Template rendering for stencil.
//! Wraps MiniJinja with the two supported dialects and the custom filter table.
use std::fmt;

use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment};

use crate::error::Result;
use crate::filters;
use crate::values::ValuesContext;

/// Template grammar used for a whole run. Never mixed within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `${{ values.name }}` expressions, values bound as `values`.
    #[default]
    Default,
    /// Cookiecutter style `{{ cookiecutter.name }}` expressions.
    Compat,
}

impl Dialect {
    /// Name the values context is bound under inside templates.
    pub fn binding(&self) -> &'static str {
        match self {
            Dialect::Default => "values",
            Dialect::Compat => "cookiecutter",
        }
    }

    /// Builds the rendering context by nesting the values under the dialect binding.
    pub fn context(&self, values: &ValuesContext) -> serde_json::Value {
        let mut context = serde_json::Map::new();
        context.insert(self.binding().to_string(), serde_json::json!(values));
        serde_json::Value::Object(context)
    }

    /// Custom delimiters, `None` for the standard Jinja syntax.
    fn syntax(&self) -> Result<Option<SyntaxConfig>> {
        match self {
            Dialect::Default => Ok(Some(
                SyntaxConfig::builder()
                    .block_delimiters("{%", "%}")
                    .variable_delimiters("${{", "}}")
                    .comment_delimiters("{#", "#}")
                    .build()?,
            )),
            Dialect::Compat => Ok(None),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Default => write!(f, "default"),
            Dialect::Compat => write!(f, "compat"),
        }
    }
}

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;

    /// Dialect the renderer was configured with.
    fn dialect(&self) -> Dialect;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
    dialect: Dialect,
}

impl MiniJinjaRenderer {
    /// Creates a renderer for the given dialect.
    ///
    /// Auto-escaping is disabled and trailing newlines are kept so that file
    /// contents come out exactly as written apart from the substitutions.
    pub fn new(dialect: Dialect) -> Result<Self> {
        let mut env = Environment::new();
        if let Some(syntax) = dialect.syntax()? {
            env.set_syntax(syntax);
        }
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_keep_trailing_newline(true);

        env.add_filter("dump", filters::dump);
        env.add_filter("parse_repo_url", filters::parse_repo_url);
        env.add_filter("project_slug", filters::project_slug);
        env.add_filter("snake_case", filters::snake_case);
        env.add_filter("kebab_case", filters::kebab_case);
        env.add_filter("camel_case", filters::camel_case);
        env.add_filter("pascal_case", filters::pascal_case);
        if dialect == Dialect::Compat {
            env.add_filter("jsonify", filters::dump);
        }

        Ok(Self { env, dialect })
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` if the template does not parse or fails to evaluate
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.env.render_str(template, context)?)
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}
