//! Local-disk filesystem
//!
//! Paths handed to a rooted instance are interpreted relative to the root,
//! so a logical path like `/tmp/out/part-r-00000` lands under the root
//! directory instead of the real `/tmp`.

use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};

use parity_core::{FileStatus, FileSystem, FsError, FsResult};

/// `FileSystem` backed by `std::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystem {
    root: Option<PathBuf>,
}

impl LocalFileSystem {
    /// Use paths exactly as given
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every path beneath `root`
    pub fn rooted(root: impl AsRef<Path>) -> Self {
        LocalFileSystem {
            root: Some(root.as_ref().to_path_buf()),
        }
    }

    /// Physical location of a logical path
    ///
    /// A rooted instance never resolves above its root: `..` at the root is
    /// dropped.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            None => path.to_path_buf(),
            Some(root) => {
                let mut out = root.clone();
                let mut depth = 0usize;
                for component in path.components() {
                    match component {
                        Component::Normal(part) => {
                            out.push(part);
                            depth += 1;
                        }
                        Component::ParentDir => {
                            if depth > 0 {
                                out.pop();
                                depth -= 1;
                            }
                        }
                        Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
                    }
                }
                out
            }
        }
    }
}

fn map_io(err: io::Error, path: &Path) -> FsError {
    if err.kind() == io::ErrorKind::NotFound {
        FsError::NotFound(path.to_path_buf())
    } else {
        FsError::Io(err)
    }
}

impl FileSystem for LocalFileSystem {
    fn list_status(&self, dir: &Path) -> FsResult<Vec<FileStatus>> {
        let physical = self.resolve(dir);
        let meta = fs::metadata(&physical).map_err(|e| map_io(e, dir))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(dir.to_path_buf()));
        }

        let mut statuses = Vec::new();
        for entry in fs::read_dir(&physical).map_err(|e| map_io(e, dir))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if meta.is_dir() {
                statuses.push(FileStatus::dir(name));
            } else {
                statuses.push(FileStatus::file(name, meta.len()));
            }
        }
        Ok(statuses)
    }

    fn open(&self, path: &Path) -> FsResult<Box<dyn Read + Send>> {
        let physical = self.resolve(path);
        if physical.is_dir() {
            return Err(FsError::IsADirectory(path.to_path_buf()));
        }
        let file = fs::File::open(&physical).map_err(|e| map_io(e, path))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create(&self, path: &Path) -> FsResult<Box<dyn Write + Send>> {
        let physical = self.resolve(path);
        if let Some(parent) = physical.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&physical)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn copy(&self, src: &Path, dst: &Path) -> FsResult<()> {
        let from = self.resolve(src);
        if from.is_dir() {
            return Err(FsError::IsADirectory(src.to_path_buf()));
        }
        let to = self.resolve(dst);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &to).map_err(|e| map_io(e, src))?;
        Ok(())
    }

    fn delete(&self, path: &Path, recursive: bool) -> FsResult<bool> {
        let physical = self.resolve(path);
        let meta = match fs::symlink_metadata(&physical) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(FsError::Io(e)),
        };

        if !meta.is_dir() {
            fs::remove_file(&physical)?;
        } else if recursive {
            fs::remove_dir_all(&physical)?;
        } else {
            let populated = fs::read_dir(&physical)?.next().is_some();
            if populated {
                return Err(FsError::DirectoryNotEmpty(path.to_path_buf()));
            }
            fs::remove_dir(&physical)?;
        }
        Ok(true)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(fs_: &LocalFileSystem, path: &str, data: &[u8]) {
        let mut w = fs_.create(Path::new(path)).unwrap();
        w.write_all(data).unwrap();
        w.flush().unwrap();
    }

    #[test]
    fn test_rooted_resolution_strips_absolute_prefix() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        assert_eq!(
            fs_.resolve(Path::new("/tmp/out/part-0")),
            dir.path().join("tmp/out/part-0")
        );
    }

    #[test]
    fn test_parent_components_stay_inside_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let fs_ = LocalFileSystem::rooted(&root);

        assert_eq!(fs_.resolve(Path::new("/../x")), root.join("x"));
        assert_eq!(fs_.resolve(Path::new("/a/../../b")), root.join("b"));
        assert_eq!(fs_.resolve(Path::new("/a/b/../c")), root.join("a/c"));
    }

    #[test]
    fn test_rooted_delete_cannot_reach_sibling_of_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        let victim = dir.path().join("victim");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&victim).unwrap();
        std::fs::write(victim.join("keep.txt"), b"keep").unwrap();
        let fs_ = LocalFileSystem::rooted(&root);

        let deleted = fs_.delete(Path::new("/../victim"), true).unwrap();
        assert!(!deleted);
        assert!(victim.join("keep.txt").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_list_status_reports_lengths() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        write(&fs_, "/out/part-r-00000", &[7u8; 120]);
        write(&fs_, "/out/_SUCCESS", b"");

        let mut listing = fs_.list_status(Path::new("/out")).unwrap();
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            listing,
            vec![
                FileStatus::file("_SUCCESS", 0),
                FileStatus::file("part-r-00000", 120),
            ]
        );
    }

    #[test]
    fn test_list_missing_dir_is_not_found() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        let err = fs_.list_status(Path::new("/nope")).unwrap_err();
        assert!(matches!(err, FsError::NotFound(_)));
    }

    #[test]
    fn test_list_file_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        write(&fs_, "/f", b"x");
        let err = fs_.list_status(Path::new("/f")).unwrap_err();
        assert!(matches!(err, FsError::NotADirectory(_)));
    }

    #[test]
    fn test_open_reads_back() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        write(&fs_, "/a/b.txt", b"hello");
        let mut buf = Vec::new();
        fs_.open(Path::new("/a/b.txt"))
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, b"hello");
    }

    #[test]
    fn test_copy_and_delete() {
        let dir = TempDir::new().unwrap();
        let fs_ = LocalFileSystem::rooted(dir.path());
        write(&fs_, "/build/rss-client-mr-0.10.jar", b"jar");

        fs_.copy(
            Path::new("/build/rss-client-mr-0.10.jar"),
            Path::new("/rss.jar/rss-client-mr-0.10.jar"),
        )
        .unwrap();
        assert!(fs_.exists(Path::new("/rss.jar/rss-client-mr-0.10.jar")));

        let err = fs_.delete(Path::new("/rss.jar"), false).unwrap_err();
        assert!(matches!(err, FsError::DirectoryNotEmpty(_)));

        assert!(fs_.delete(Path::new("/rss.jar"), true).unwrap());
        assert!(!fs_.exists(Path::new("/rss.jar")));
        assert!(!fs_.delete(Path::new("/rss.jar"), true).unwrap());
    }
}
