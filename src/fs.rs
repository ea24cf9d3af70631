//! Filesystem seam consumed by the navigator: list, stat, delete.
//!
//! Every call is treated as a single atomic operation; there is no partial
//! result and no retry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub trait FileSystem: Send + Sync {
    /// Immediate entries of `dir` as full paths, in whatever order the OS returns them.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is a directory (symlinks followed).
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The real disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl FileSystem for DiskFs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            out.push(entry?.path());
        }
        Ok(out)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        Ok(fs::metadata(path)?.is_dir())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

impl<T: FileSystem + ?Sized> FileSystem for std::sync::Arc<T> {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).list_dir(dir)
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        (**self).is_dir(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }
}
