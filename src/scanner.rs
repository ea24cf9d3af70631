//! Directory scanner: sibling images of a file, sibling folders of a folder.
//!
//! Nothing here is cached. Every call goes back to the filesystem.

use std::path::{Path, PathBuf};

use crate::error::{NavError, NavResult};
use crate::fs::FileSystem;
use crate::media::is_image_file;

/// Which way to step through a sorted list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Recognized images directly inside `dir`, sorted and unique.
pub fn list_images(fs: &dyn FileSystem, dir: &Path) -> NavResult<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = fs
        .list_dir(dir)
        .map_err(|e| NavError::list(dir, e))?
        .into_iter()
        .filter(|p| is_image_file(p))
        .collect();
    images.sort();
    images.dedup();
    Ok(images)
}

/// Subdirectories directly inside `parent`, sorted.
pub fn list_dirs(fs: &dyn FileSystem, parent: &Path) -> NavResult<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs
        .list_dir(parent)
        .map_err(|e| NavError::list(parent, e))?
    {
        if fs.is_dir(&entry).map_err(|e| NavError::stat(&entry, e))? {
            dirs.push(entry);
        }
    }
    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}

/// First image of `dir` in sorted order, `None` if it holds no images.
pub fn first_image_in(fs: &dyn FileSystem, dir: &Path) -> NavResult<Option<PathBuf>> {
    Ok(list_images(fs, dir)?.into_iter().next())
}

/// Neighbor of `current` within `sorted`, without wrapping.
///
/// `None` if `current` is absent or sits at the boundary in that direction.
pub fn neighbor<'a>(sorted: &'a [PathBuf], current: &Path, dir: Direction) -> Option<&'a PathBuf> {
    let idx = sorted.iter().position(|p| p == current)?;
    match dir {
        Direction::Forward => sorted.get(idx + 1),
        Direction::Backward => idx.checked_sub(1).and_then(|i| sorted.get(i)),
    }
}
