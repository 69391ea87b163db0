//! File tree capability used by the walker.
//!
//! The walker never touches `std::fs` directly, it goes through
//! [`FileSystem`]. [`DiskFs`] is the real implementation and [`MemoryFs`]
//! keeps a whole tree in memory for tests.

use std::io;
use std::path::{Path, PathBuf};

pub mod disk;
pub mod memory;

pub use disk::DiskFs;
pub use memory::MemoryFs;

/// Kind of a tree entry. Symlinks are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// Metadata of an entry, read without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    /// Permission bits (`0o7777` mask).
    pub mode: u32,
}

/// A directory entry as returned by [`FileSystem::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

pub trait FileSystem {
    /// Lists the entries of `path`, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Whether anything (including a dangling symlink) exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        self.metadata(path).is_ok()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Creates or truncates the file at `path`.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Creates a symlink at `link` pointing to `target`, verbatim.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Removes a file or a symlink.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}
