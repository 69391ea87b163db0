//! Custom filters registered on the template environment.
//!
//! `dump` is available in both dialects, the compat dialect additionally
//! exposes it under the cookiecutter name `jsonify`.

use std::collections::HashMap;

use cruet::Inflector;
use minijinja::{Error, ErrorKind, Value};
use serde::Serialize;
use url::Url;

/// Serializes a value into compact JSON.
pub fn dump(value: Value) -> Result<String, Error> {
    serde_json::to_string(&value).map_err(|e| {
        Error::new(ErrorKind::InvalidOperation, format!("cannot serialize value: {e}"))
    })
}

/// Components of a repository locator such as `github.com?owner=acme&repo=api`.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RepoSpec {
    pub host: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl RepoSpec {
    pub fn parse(repo_url: &str) -> Result<Self, Error> {
        let url = Url::parse(&format!("https://{repo_url}")).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, format!("invalid repo url '{repo_url}': {e}"))
        })?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidOperation, format!("no host in '{repo_url}'"))
            })?
            .to_string();

        let mut query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let repo = query.remove("repo").filter(|repo| !repo.is_empty()).ok_or_else(|| {
            Error::new(ErrorKind::InvalidOperation, format!("no repo in '{repo_url}'"))
        })?;

        Ok(Self {
            host,
            repo,
            owner: query.remove("owner"),
            organization: query.remove("organization"),
            workspace: query.remove("workspace"),
            project: query.remove("project"),
        })
    }
}

/// Splits a repository locator into its components.
pub fn parse_repo_url(repo_url: String) -> Result<Value, Error> {
    Ok(Value::from_serialize(RepoSpec::parse(&repo_url)?))
}

/// `owner/repo` for a repository locator, falling back to the workspace.
pub fn project_slug(repo_url: String) -> Result<String, Error> {
    let spec = RepoSpec::parse(&repo_url)?;
    match spec.owner.or(spec.workspace) {
        Some(owner) => Ok(format!("{}/{}", owner, spec.repo)),
        None => Ok(spec.repo),
    }
}

pub fn snake_case(value: String) -> String {
    value.to_snake_case()
}

pub fn kebab_case(value: String) -> String {
    value.to_kebab_case()
}

pub fn camel_case(value: String) -> String {
    value.to_camel_case()
}

pub fn pascal_case(value: String) -> String {
    value.to_pascal_case()
}
