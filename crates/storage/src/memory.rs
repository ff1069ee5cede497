//! In-memory filesystem
//!
//! Cloning yields another handle onto the same tree, so a fake cluster and
//! the verifier can share one instance. Directories exist explicitly or
//! implicitly as ancestors of a file. The number of `open` calls is
//! tracked so tests can assert that no byte comparison took place.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use parity_core::{FileStatus, FileSystem, FsError, FsResult};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl Tree {
    fn add_ancestors(&mut self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }
}

#[derive(Debug, Default)]
struct Inner {
    tree: RwLock<Tree>,
    opens: AtomicUsize,
}

/// Shared in-memory `FileSystem`
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Inner>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file directly, creating parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut tree = self.inner.tree.write();
        tree.add_ancestors(path);
        tree.files.insert(path.to_path_buf(), data.into());
    }

    /// Create an empty directory and its ancestors
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut tree = self.inner.tree.write();
        tree.add_ancestors(path);
        tree.dirs.insert(path.to_path_buf());
    }

    /// Contents of a file, if present
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.inner.tree.read().files.get(path.as_ref()).cloned()
    }

    /// Every file path currently stored
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.inner.tree.read().files.keys().cloned().collect()
    }

    /// How many times `open` has succeeded
    pub fn open_count(&self) -> usize {
        self.inner.opens.load(Ordering::Relaxed)
    }
}

impl FileSystem for MemoryFileSystem {
    fn list_status(&self, dir: &Path) -> FsResult<Vec<FileStatus>> {
        let tree = self.inner.tree.read();
        if tree.files.contains_key(dir) {
            return Err(FsError::NotADirectory(dir.to_path_buf()));
        }
        if !tree.is_dir(dir) {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }

        let mut statuses = Vec::new();
        for (path, data) in &tree.files {
            if path.parent() == Some(dir) {
                if let Some(name) = path.file_name() {
                    statuses.push(FileStatus::file(
                        name.to_string_lossy(),
                        data.len() as u64,
                    ));
                }
            }
        }
        for path in &tree.dirs {
            if path.parent() == Some(dir) {
                if let Some(name) = path.file_name() {
                    statuses.push(FileStatus::dir(name.to_string_lossy()));
                }
            }
        }
        Ok(statuses)
    }

    fn open(&self, path: &Path) -> FsResult<Box<dyn Read + Send>> {
        let tree = self.inner.tree.read();
        match tree.files.get(path) {
            Some(data) => {
                self.inner.opens.fetch_add(1, Ordering::Relaxed);
                Ok(Box::new(Cursor::new(data.clone())))
            }
            None if tree.is_dir(path) => Err(FsError::IsADirectory(path.to_path_buf())),
            None => Err(FsError::NotFound(path.to_path_buf())),
        }
    }

    fn create(&self, path: &Path) -> FsResult<Box<dyn Write + Send>> {
        {
            let mut tree = self.inner.tree.write();
            if tree.is_dir(path) {
                return Err(FsError::IsADirectory(path.to_path_buf()));
            }
            tree.add_ancestors(path);
            tree.files.insert(path.to_path_buf(), Vec::new());
        }
        Ok(Box::new(MemoryWriter {
            inner: Arc::clone(&self.inner),
            path: path.to_path_buf(),
        }))
    }

    fn copy(&self, src: &Path, dst: &Path) -> FsResult<()> {
        let mut tree = self.inner.tree.write();
        let data = match tree.files.get(src) {
            Some(data) => data.clone(),
            None if tree.is_dir(src) => return Err(FsError::IsADirectory(src.to_path_buf())),
            None => return Err(FsError::NotFound(src.to_path_buf())),
        };
        tree.add_ancestors(dst);
        tree.files.insert(dst.to_path_buf(), data);
        Ok(())
    }

    fn delete(&self, path: &Path, recursive: bool) -> FsResult<bool> {
        let mut tree = self.inner.tree.write();
        if tree.files.remove(path).is_some() {
            return Ok(true);
        }
        if !tree.is_dir(path) {
            return Ok(false);
        }

        let populated = tree.files.keys().any(|p| p.starts_with(path))
            || tree.dirs.iter().any(|d| d != path && d.starts_with(path));
        if populated && !recursive {
            return Err(FsError::DirectoryNotEmpty(path.to_path_buf()));
        }
        tree.files.retain(|p, _| !p.starts_with(path));
        tree.dirs.retain(|d| !d.starts_with(path));
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.inner.tree.read();
        tree.files.contains_key(path) || tree.is_dir(path)
    }
}

/// Appends into the shared tree on every write
struct MemoryWriter {
    inner: Arc<Inner>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut tree = self.inner.tree.write();
        match tree.files.get_mut(&self.path) {
            Some(data) => {
                data.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} was deleted while open", self.path.display()),
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
