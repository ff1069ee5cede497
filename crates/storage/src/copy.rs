//! Cross-filesystem copy

use std::io::{self, Write};
use std::path::Path;

use parity_core::{FileSystem, FsResult};
use tracing::debug;

/// Stream `src` on `from` into `dst` on `to`, returning bytes copied
///
/// `dst` is created or truncated; parent directories are created by the
/// destination filesystem.
pub fn copy_between(
    from: &dyn FileSystem,
    src: &Path,
    to: &dyn FileSystem,
    dst: &Path,
) -> FsResult<u64> {
    let mut reader = from.open(src)?;
    let mut writer = to.create(dst)?;
    let copied = io::copy(&mut reader, &mut writer)?;
    writer.flush()?;
    debug!(
        target: "parity::fs",
        src = %src.display(),
        dst = %dst.display(),
        bytes = copied,
        "Copied file across filesystems"
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalFileSystem, MemoryFileSystem};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_copy_local_to_memory() {
        let dir = TempDir::new().unwrap();
        let local = LocalFileSystem::rooted(dir.path());
        {
            let mut w = local.create(Path::new("/build/client.jar")).unwrap();
            w.write_all(&[0xCA, 0xFE, 0xBA, 0xBE]).unwrap();
            w.flush().unwrap();
        }

        let memory = MemoryFileSystem::new();
        let copied = copy_between(
            &local,
            Path::new("/build/client.jar"),
            &memory,
            Path::new("/rss.jar/client.jar"),
        )
        .unwrap();

        assert_eq!(copied, 4);
        assert_eq!(
            memory.read("/rss.jar/client.jar").unwrap(),
            vec![0xCA, 0xFE, 0xBA, 0xBE]
        );
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let memory = MemoryFileSystem::new();
        let other = MemoryFileSystem::new();
        assert!(copy_between(&memory, Path::new("/none"), &other, Path::new("/x")).is_err());
        assert!(!other.exists(Path::new("/x")));
    }
}
