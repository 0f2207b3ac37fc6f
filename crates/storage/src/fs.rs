// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-system seam for store artifact handling.
//!
//! Every directory listing, move, and delete the swap helper performs goes
//! through [`FileSystem`], so swap ordering and failure handling can be tested
//! against an in-memory fake with error injection.

use std::io;
use std::path::{Path, PathBuf};

/// File operations needed to swap store artifacts.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a regular file (directories are not store artifacts).
    fn is_file(&self, path: &Path) -> bool;

    /// Full paths of the entries directly inside `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Move a file, replacing nothing: callers clear the destination first.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}

/// Production file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        match std::fs::rename(from, to) {
            Ok(()) => Ok(()),
            // Scratch may live on another device; fall back to copy + delete
            Err(rename_err) if from.is_file() => {
                if std::fs::copy(from, to).is_err() {
                    let _ = std::fs::remove_file(to);
                    return Err(rename_err);
                }
                finish_copy(from, to, |path| std::fs::remove_file(path))
            }
            Err(e) => Err(e),
        }
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }
}

/// Complete a copy-based move by removing `from`. If that fails the copy at
/// `to` is removed too, so a failed move never leaves the file in both places.
fn finish_copy(
    from: &Path,
    to: &Path,
    remove: impl Fn(&Path) -> io::Result<()>,
) -> io::Result<()> {
    if let Err(e) = remove(from) {
        let _ = remove(to);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
