//! Skeleton retrieval.
//! Populates the staging directory from either the local filesystem or a
//! git repository.
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fs::{DiskFs, FileSystem};

/// Represents the location a skeleton is fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Local filesystem directory
    FileSystem(PathBuf),
    /// Git repository URL (HTTPS, SSH or git protocol)
    Git(String),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::FileSystem(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            TemplateSource::Git(repo) => write!(f, "git repository: '{repo}'"),
        }
    }
}

fn is_git_url(s: &str) -> bool {
    if s.starts_with("git@") {
        return true;
    }
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "https" | "http" | "git" | "ssh"),
        Err(_) => false,
    }
}

impl TemplateSource {
    /// Resolves `fetch_url` against the optional `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Location the relative `fetch_url` is resolved against,
    ///   either a `file:` URL or a plain directory path
    /// * `fetch_url` - Skeleton location given by the caller
    ///
    /// # Errors
    /// * `Error::FetchError` if a relative location has no usable base
    pub fn resolve(base_url: Option<&str>, fetch_url: &str) -> Result<Self> {
        if is_git_url(fetch_url) {
            return Ok(Self::Git(fetch_url.to_string()));
        }
        if let Ok(url) = Url::parse(fetch_url) {
            if url.scheme() == "file" {
                return file_url_to_path(&url, fetch_url).map(Self::FileSystem);
            }
        }

        let path = PathBuf::from(fetch_url);
        if path.is_absolute() {
            return Ok(Self::FileSystem(path));
        }

        match base_url {
            None => Ok(Self::FileSystem(path)),
            Some(base) => match Url::parse(base) {
                Ok(base_url) if base_url.scheme() == "file" => {
                    let joined = base_url.join(fetch_url).map_err(|e| fetch_error(fetch_url, e))?;
                    file_url_to_path(&joined, fetch_url).map(Self::FileSystem)
                }
                Ok(_) => Err(fetch_error(
                    fetch_url,
                    format!("relative location cannot be resolved against '{base}'"),
                )),
                Err(_) => Ok(Self::FileSystem(Path::new(base).join(path))),
            },
        }
    }
}

fn file_url_to_path(url: &Url, fetch_url: &str) -> Result<PathBuf> {
    url.to_file_path()
        .map_err(|_| fetch_error(fetch_url, format!("'{url}' is not a local path")))
}

fn fetch_error<E: Into<Box<dyn std::error::Error + Send + Sync>>>(url: &str, source: E) -> Error {
    Error::FetchError { url: url.to_string(), source: source.into() }
}

/// Request handed to a [`ContentFetcher`].
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub base_url: Option<String>,
    pub fetch_url: String,
    /// Directory to populate. It may not exist yet.
    pub output_path: PathBuf,
}

/// Collaborator that fills a staging directory with the raw skeleton.
pub trait ContentFetcher {
    /// Fetches the skeleton.
    ///
    /// Must not return before `request.output_path` is completely populated.
    fn fetch_contents(&self, request: &FetchRequest) -> Result<()>;
}

/// Copies a local directory, keeping symlinks and permission bits.
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn copy_tree(&self, source: &Path, output_path: &Path, url: &str) -> Result<()> {
        if !source.is_dir() {
            return Err(fetch_error(
                url,
                format!("'{}' does not exist or is not a directory", source.display()),
            ));
        }

        let disk = DiskFs::new();
        for entry in WalkDir::new(source).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| fetch_error(url, e))?;
            let relative = entry.path().strip_prefix(source).map_err(|e| fetch_error(url, e))?;
            let target = output_path.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&target).map_err(|e| Error::filesystem(&target, e))?;
            } else if file_type.is_symlink() {
                let link = fs::read_link(entry.path())
                    .map_err(|e| Error::filesystem(entry.path(), e))?;
                disk.symlink(&link, &target).map_err(|e| Error::filesystem(&target, e))?;
            } else {
                fs::copy(entry.path(), &target).map_err(|e| Error::filesystem(&target, e))?;
                let mode =
                    disk.metadata(entry.path()).map_err(|e| Error::filesystem(entry.path(), e))?;
                disk.set_mode(&target, mode.mode).map_err(|e| Error::filesystem(&target, e))?;
            }
        }
        Ok(())
    }
}

impl ContentFetcher for LocalFetcher {
    fn fetch_contents(&self, request: &FetchRequest) -> Result<()> {
        match TemplateSource::resolve(request.base_url.as_deref(), &request.fetch_url)? {
            TemplateSource::FileSystem(path) => {
                debug!("Copying '{}' to '{}'", path.display(), request.output_path.display());
                self.copy_tree(&path, &request.output_path, &request.fetch_url)
            }
            source => Err(fetch_error(
                &request.fetch_url,
                format!("{source} cannot be fetched from the local filesystem"),
            )),
        }
    }
}

/// Clones a git repository into the staging directory.
///
/// The `.git` directory is removed after cloning so that only the skeleton
/// remains.
pub struct GitFetcher;

impl GitFetcher {
    pub fn clone_into(&self, repo_url: &str, output_path: &Path) -> Result<()> {
        debug!("Cloning repository '{}' to '{}'.", repo_url, output_path.display());

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
            } else {
                git2::Cred::default()
            }
        });

        let mut fetch_opts = git2::FetchOptions::new();
        fetch_opts.remote_callbacks(callbacks);
        fetch_opts.depth(1);

        let mut builder = git2::build::RepoBuilder::new();
        builder.fetch_options(fetch_opts);
        builder.clone(repo_url, output_path).map_err(|e| fetch_error(repo_url, e))?;

        let git_dir = output_path.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir).map_err(|e| Error::filesystem(&git_dir, e))?;
        }
        Ok(())
    }
}

impl ContentFetcher for GitFetcher {
    fn fetch_contents(&self, request: &FetchRequest) -> Result<()> {
        match TemplateSource::resolve(request.base_url.as_deref(), &request.fetch_url)? {
            TemplateSource::Git(repo) => self.clone_into(&repo, &request.output_path),
            source => Err(fetch_error(
                &request.fetch_url,
                format!("{source} is not a git repository"),
            )),
        }
    }
}

/// Dispatches to [`LocalFetcher`] or [`GitFetcher`] depending on the location.
#[derive(Default)]
pub struct DefaultFetcher;

impl ContentFetcher for DefaultFetcher {
    fn fetch_contents(&self, request: &FetchRequest) -> Result<()> {
        let source = TemplateSource::resolve(request.base_url.as_deref(), &request.fetch_url)?;
        debug!("Fetching skeleton from the {source}");
        match source {
            TemplateSource::Git(repo) => GitFetcher.clone_into(&repo, &request.output_path),
            TemplateSource::FileSystem(path) => {
                LocalFetcher.copy_tree(&path, &request.output_path, &request.fetch_url)
            }
        }
    }
}
