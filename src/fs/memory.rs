use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::{DirEntry, EntryKind, EntryMetadata, FileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { contents: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
    Symlink { target: PathBuf },
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Node::File { .. } => EntryKind::File,
            Node::Dir { .. } => EntryKind::Dir,
            Node::Symlink { .. } => EntryKind::Symlink,
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such entry: {}", path.display()))
}

/// In-memory [`FileSystem`].
///
/// Paths are used as given, without any normalization, and the root `/`
/// always exists. Symlinks are stored but never resolved.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        // a poisoned lock only means another test thread panicked
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_parent(nodes: &BTreeMap<PathBuf, Node>, path: &Path) -> io::Result<()> {
        match path.parent() {
            None => Ok(()),
            Some(parent) if parent.as_os_str().is_empty() || parent == Path::new("/") => Ok(()),
            Some(parent) => match nodes.get(parent) {
                Some(Node::Dir { .. }) => Ok(()),
                Some(_) => Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("not a directory: {}", parent.display()),
                )),
                None => Err(not_found(parent)),
            },
        }
    }

    /// Adds a file with mode `0o644`, creating parent directories.
    pub fn add_file<P: AsRef<Path>, C: AsRef<[u8]>>(&self, path: P, contents: C) -> &Self {
        self.add_file_with_mode(path, contents, 0o644)
    }

    pub fn add_file_with_mode<P: AsRef<Path>, C: AsRef<[u8]>>(
        &self,
        path: P,
        contents: C,
        mode: u32,
    ) -> &Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes()
            .insert(path.to_path_buf(), Node::File { contents: contents.as_ref().to_vec(), mode });
        self
    }

    /// Adds a directory and all of its ancestors.
    pub fn add_dir<P: AsRef<Path>>(&self, path: P) -> &Self {
        let mut nodes = self.nodes();
        let mut current = PathBuf::new();
        for component in path.as_ref().components() {
            current.push(component);
            if matches!(component, Component::RootDir | Component::Prefix(_)) {
                continue;
            }
            nodes.entry(current.clone()).or_insert(Node::Dir { mode: 0o755 });
        }
        self
    }

    pub fn add_symlink<P: AsRef<Path>, T: AsRef<Path>>(&self, path: P, target: T) -> &Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.nodes()
            .insert(path.to_path_buf(), Node::Symlink { target: target.as_ref().to_path_buf() });
        self
    }

    /// Contents of the file at `path`, if it is a file.
    pub fn file<P: AsRef<Path>>(&self, path: P) -> Option<Vec<u8>> {
        match self.nodes().get(path.as_ref()) {
            Some(Node::File { contents, .. }) => Some(contents.clone()),
            _ => None,
        }
    }

    /// Contents of the file at `path` as a string.
    pub fn file_string<P: AsRef<Path>>(&self, path: P) -> Option<String> {
        self.file(path).and_then(|contents| String::from_utf8(contents).ok())
    }

    pub fn is_dir<P: AsRef<Path>>(&self, path: P) -> bool {
        matches!(self.nodes().get(path.as_ref()), Some(Node::Dir { .. }))
    }

    /// All entry paths below `root`, relative to it, in sorted order.
    pub fn paths_under<P: AsRef<Path>>(&self, root: P) -> Vec<PathBuf> {
        let root = root.as_ref();
        self.nodes()
            .keys()
            .filter_map(|path| path.strip_prefix(root).ok())
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect()
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.nodes();
        if path != Path::new("/") && !matches!(nodes.get(path), Some(Node::Dir { .. })) {
            return Err(not_found(path));
        }
        let mut entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .filter_map(|(child, node)| {
                let name = child.file_name()?.to_str()?.to_string();
                Some(DirEntry { name, path: child.clone(), kind: node.kind() })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        if path == Path::new("/") {
            return Ok(EntryMetadata { kind: EntryKind::Dir, mode: 0o755 });
        }
        match self.nodes().get(path) {
            Some(Node::File { mode, .. }) => Ok(EntryMetadata { kind: EntryKind::File, mode: *mode }),
            Some(Node::Dir { mode }) => Ok(EntryMetadata { kind: EntryKind::Dir, mode: *mode }),
            Some(Node::Symlink { .. }) => {
                Ok(EntryMetadata { kind: EntryKind::Symlink, mode: 0o777 })
            }
            None => Err(not_found(path)),
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.file(path).ok_or_else(|| not_found(path))
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self.nodes().get(path) {
            Some(Node::Symlink { target }) => Ok(target.clone()),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symlink: {}", path.display()),
            )),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let nodes = self.nodes();
        for ancestor in path.ancestors() {
            if let Some(node) = nodes.get(ancestor) {
                if !matches!(node, Node::Dir { .. }) {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("not a directory: {}", ancestor.display()),
                    ));
                }
            }
        }
        drop(nodes);
        self.add_dir(path);
        Ok(())
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut nodes = self.nodes();
        Self::ensure_parent(&nodes, path)?;
        let mode = match nodes.get(path) {
            Some(Node::File { mode, .. }) => *mode,
            Some(Node::Dir { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("is a directory: {}", path.display()),
                ))
            }
            _ => 0o644,
        };
        nodes.insert(path.to_path_buf(), Node::File { contents: contents.to_vec(), mode });
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut nodes = self.nodes();
        Self::ensure_parent(&nodes, link)?;
        if nodes.contains_key(link) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("entry exists: {}", link.display()),
            ));
        }
        nodes.insert(link.to_path_buf(), Node::Symlink { target: target.to_path_buf() });
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.nodes();
        match nodes.get(path) {
            Some(Node::File { .. }) | Some(Node::Symlink { .. }) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        match self.nodes().get_mut(path) {
            Some(Node::File { mode: current, .. }) | Some(Node::Dir { mode: current }) => {
                *current = mode & 0o7777;
                Ok(())
            }
            Some(Node::Symlink { .. }) => Ok(()),
            None => Err(not_found(path)),
        }
    }
}
