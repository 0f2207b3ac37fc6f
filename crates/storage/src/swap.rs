// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store artifact swapping.
//!
//! A store is a primary file plus sidecars sharing its file stem
//! (`library.store`, `library.store-journal`). Migrated artifacts are written
//! to a scratch destination named `<id>.<ext>` and then moved over the
//! originals as a unit.
//!
//! ## Strategies
//!
//! ```text
//! InPlace                          Staged
//! ───────────────────────          ─────────────────────────────────────
//! delete originals                 scratch → .<stem>.staging-<id>/
//! scratch → store dir              originals → .<stem>.backup-<id>/
//!                                  staging → store dir
//!                                  remove backup + staging dirs
//! ```
//!
//! InPlace has a window where some artifacts are deleted or replaced and
//! others are not. Staged keeps every original until all new artifacts are
//! in place and rolls back on failure; if rollback itself fails the error
//! names the backup directory holding the originals. A later migration finds
//! such a directory through [`FileSwap::interrupted_swap`] and refuses to run.

use crate::fs::{FileSystem, RealFileSystem};
use crate::Diagnostic;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use sw_core::{IdGen, UuidIdGen};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Attempts at picking an unused scratch name before giving up
const MAX_SCRATCH_ATTEMPTS: usize = 8;

/// Errors from artifact swapping
#[derive(Debug, Error)]
pub enum FileError {
    #[error("scratch directory {path} unavailable: {source}")]
    ScratchUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to list {path}: {source}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to delete {path}: {source}")]
    DeletionFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    DirectoryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no migrated artifacts found for {0}")]
    NoArtifacts(PathBuf),
    #[error("rollback failed restoring {path}; original artifacts remain in {backup_dir}: {source}")]
    RollbackFailed {
        backup_dir: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        let path = match self {
            FileError::ScratchUnavailable { path, .. }
            | FileError::ListFailed { path, .. }
            | FileError::DeletionFailed { path, .. }
            | FileError::DirectoryFailed { path, .. }
            | FileError::NoArtifacts(path) => path,
            FileError::MoveFailed { to, .. } => to,
            FileError::RollbackFailed { backup_dir, .. } => backup_dir,
        };
        Some(Diagnostic::Path(path.clone()))
    }
}

/// How migrated artifacts replace the originals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStrategy {
    /// Stage, back up, promote, with rollback
    #[default]
    Staged,
    /// Delete originals, then move new artifacts in
    InPlace,
}

impl std::str::FromStr for SwapStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staged" => Ok(SwapStrategy::Staged),
            "in_place" | "in-place" => Ok(SwapStrategy::InPlace),
            other => Err(format!("unknown swap strategy '{other}'")),
        }
    }
}

/// Scratch allocation and artifact replacement for one scratch directory.
pub struct FileSwap<F: FileSystem = RealFileSystem, G: IdGen = UuidIdGen> {
    fs: F,
    ids: G,
    scratch_dir: PathBuf,
    strategy: SwapStrategy,
}

impl FileSwap<RealFileSystem, UuidIdGen> {
    pub fn new(scratch_dir: PathBuf, strategy: SwapStrategy) -> Self {
        Self::with_parts(RealFileSystem, UuidIdGen, scratch_dir, strategy)
    }
}

impl<F: FileSystem, G: IdGen> FileSwap<F, G> {
    /// Create a swap helper with a custom file system and id source (for testing).
    pub fn with_parts(fs: F, ids: G, scratch_dir: PathBuf, strategy: SwapStrategy) -> Self {
        Self {
            fs,
            ids,
            scratch_dir,
            strategy,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn strategy(&self) -> SwapStrategy {
        self.strategy
    }

    pub fn store_exists(&self, store: &Path) -> bool {
        self.fs.exists(store)
    }

    /// A staging or backup directory left next to `store` by an interrupted
    /// staged swap that still holds artifacts. Empty leftovers are removed.
    pub fn interrupted_swap(&self, store: &Path) -> Result<Option<PathBuf>, FileError> {
        let dir = parent_dir(store);
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileError::ListFailed {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };

        let stem = stem_str(store);
        let prefixes = [format!(".{stem}.backup-"), format!(".{stem}.staging-")];
        let mut leftovers: Vec<PathBuf> = entries
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| prefixes.iter().any(|p| n.starts_with(p.as_str())))
                    && !self.fs.is_file(path)
            })
            .collect();
        // Backups sort before staging dirs and hold the originals
        leftovers.sort();

        for leftover in leftovers {
            let held = self
                .fs
                .read_dir(&leftover)
                .map_err(|source| FileError::ListFailed {
                    path: leftover.clone(),
                    source,
                })?;
            if !held.is_empty() {
                return Ok(Some(leftover));
            }
            debug!(path = %leftover.display(), "removing empty swap directory");
            if let Err(e) = self.fs.remove_dir(&leftover) {
                warn!(path = %leftover.display(), error = %e, "failed to remove directory");
            }
        }
        Ok(None)
    }

    /// Unused path in the scratch directory, keeping the store's extension.
    pub fn make_scratch_destination(&self, store: &Path) -> Result<PathBuf, FileError> {
        self.fs
            .create_dir_all(&self.scratch_dir)
            .map_err(|source| FileError::ScratchUnavailable {
                path: self.scratch_dir.clone(),
                source,
            })?;

        let ext = store.extension().and_then(|e| e.to_str());
        for _ in 0..MAX_SCRATCH_ATTEMPTS {
            let id = self.ids.next();
            let name = match ext {
                Some(ext) => format!("{id}.{ext}"),
                None => id,
            };
            let candidate = self.scratch_dir.join(name);
            if !self.fs.exists(&candidate) {
                return Ok(candidate);
            }
        }
        Err(FileError::ScratchUnavailable {
            path: self.scratch_dir.clone(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "no unused scratch name"),
        })
    }

    /// Every file next to `store` whose stem equals the store's stem.
    /// Directories sharing the stem are not artifacts.
    pub fn artifacts_of(&self, store: &Path) -> Result<Vec<PathBuf>, FileError> {
        let Some(stem) = store.file_stem() else {
            return Ok(Vec::new());
        };
        let dir = parent_dir(store);
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|source| FileError::ListFailed {
                path: dir.to_path_buf(),
                source,
            })?;
        let mut artifacts: Vec<PathBuf> = entries
            .into_iter()
            .filter(|p| p.file_stem() == Some(stem) && self.fs.is_file(p))
            .collect();
        artifacts.sort();
        Ok(artifacts)
    }

    /// Delete the store and all its sidecars. Stops at the first failure
    /// without restoring anything already deleted.
    pub fn delete_artifacts(&self, store: &Path) -> Result<(), FileError> {
        for path in self.artifacts_of(store)? {
            debug!(path = %path.display(), "deleting store artifact");
            self.fs
                .remove_file(&path)
                .map_err(|source| FileError::DeletionFailed { path, source })?;
        }
        Ok(())
    }

    /// Move every scratch artifact to its final name next to `store`,
    /// replacing whatever is there.
    pub fn promote_artifacts(&self, scratch: &Path, store: &Path) -> Result<(), FileError> {
        for (from, name) in self.scratch_artifacts(scratch, store)? {
            let to = parent_dir(store).join(name);
            match self.fs.remove_file(&to) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(FileError::DeletionFailed { path: to, source }),
            }
            self.fs
                .rename(&from, &to)
                .map_err(|source| FileError::MoveFailed { from, to, source })?;
        }
        Ok(())
    }

    /// Make the artifacts at `scratch` the new store at `store`.
    pub fn replace_store(&self, scratch: &Path, store: &Path) -> Result<(), FileError> {
        if self.scratch_artifacts(scratch, store)?.is_empty() {
            return Err(FileError::NoArtifacts(scratch.to_path_buf()));
        }
        match self.strategy {
            SwapStrategy::InPlace => {
                self.delete_artifacts(store)?;
                self.promote_artifacts(scratch, store)
            }
            SwapStrategy::Staged => self.staged_replace(scratch, store),
        }
    }

    /// Best-effort removal of everything written for `scratch`.
    pub fn discard_scratch(&self, scratch: &Path) {
        let Ok(artifacts) = self.scratch_artifacts(scratch, scratch) else {
            return;
        };
        for (path, _) in artifacts {
            if let Err(e) = self.fs.remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to discard scratch artifact");
            }
        }
    }

    /// Scratch files for `scratch` paired with their final names for `store`.
    fn scratch_artifacts(
        &self,
        scratch: &Path,
        store: &Path,
    ) -> Result<Vec<(PathBuf, String)>, FileError> {
        let scratch_stem = stem_str(scratch);
        let store_stem = stem_str(store);
        let dir = parent_dir(scratch);
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|source| FileError::ListFailed {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut artifacts: Vec<(PathBuf, String)> = entries
            .into_iter()
            .filter(|path| self.fs.is_file(path))
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let suffix = name.strip_prefix(scratch_stem.as_str())?;
                // `scratch-1` must not claim `scratch-10.store`
                if !(suffix.is_empty() || suffix.starts_with('.') || suffix.starts_with('-')) {
                    return None;
                }
                let final_name = format!("{store_stem}{suffix}");
                Some((path, final_name))
            })
            .collect();
        artifacts.sort();
        Ok(artifacts)
    }

    fn staged_replace(&self, scratch: &Path, store: &Path) -> Result<(), FileError> {
        let dir = parent_dir(store);
        let stem = stem_str(store);
        let token = self.ids.next();
        let staging = dir.join(format!(".{stem}.staging-{token}"));
        let backup = dir.join(format!(".{stem}.backup-{token}"));

        // 1. Stage: originals untouched on failure
        self.create_dir(&staging)?;
        let mut staged: Vec<String> = Vec::new();
        for (from, name) in self.scratch_artifacts(scratch, store)? {
            let to = staging.join(&name);
            if let Err(source) = self.fs.rename(&from, &to) {
                self.remove_all(&staging, staged.iter().map(|n| staging.join(n)));
                return Err(FileError::MoveFailed { from, to, source });
            }
            staged.push(name);
        }

        // 2. Back up originals
        let originals = match self.artifacts_of(store) {
            Ok(originals) => originals,
            Err(e) => {
                self.remove_all(&staging, staged.iter().map(|n| staging.join(n)));
                return Err(e);
            }
        };
        if let Err(e) = self.create_dir(&backup) {
            self.remove_all(&staging, staged.iter().map(|n| staging.join(n)));
            return Err(e);
        }
        let mut backed_up: Vec<(PathBuf, PathBuf)> = Vec::new();
        for original in originals {
            let Some(name) = original.file_name() else {
                continue;
            };
            let to = backup.join(name);
            if let Err(source) = self.fs.rename(&original, &to) {
                let failure = FileError::MoveFailed {
                    from: original,
                    to,
                    source,
                };
                return Err(self.roll_back(failure, &[], &backed_up, &backup, &staging, &staged));
            }
            backed_up.push((original, to));
        }

        // 3. Promote staged artifacts
        let mut promoted: Vec<PathBuf> = Vec::new();
        for name in &staged {
            let from = staging.join(name);
            let to = dir.join(name);
            if let Err(source) = self.fs.rename(&from, &to) {
                let failure = FileError::MoveFailed { from, to, source };
                return Err(self.roll_back(failure, &promoted, &backed_up, &backup, &staging, &staged));
            }
            promoted.push(to);
        }

        // 4. Commit: drop backups
        self.remove_all(&backup, backed_up.into_iter().map(|(_, b)| b));
        self.remove_all(&staging, std::iter::empty());
        Ok(())
    }

    /// Undo a failed staged swap, returning the error to report.
    fn roll_back(
        &self,
        failure: FileError,
        promoted: &[PathBuf],
        backed_up: &[(PathBuf, PathBuf)],
        backup: &Path,
        staging: &Path,
        staged: &[String],
    ) -> FileError {
        error!(error = %failure, "store swap failed, rolling back");

        for path in promoted {
            if let Err(source) = self.fs.remove_file(path) {
                if source.kind() != io::ErrorKind::NotFound {
                    return FileError::RollbackFailed {
                        backup_dir: backup.to_path_buf(),
                        path: path.clone(),
                        source,
                    };
                }
            }
        }
        for (original, saved) in backed_up {
            if let Err(source) = self.fs.rename(saved, original) {
                return FileError::RollbackFailed {
                    backup_dir: backup.to_path_buf(),
                    path: original.clone(),
                    source,
                };
            }
        }

        self.remove_all(backup, std::iter::empty());
        self.remove_all(staging, staged.iter().map(|n| staging.join(n)));
        failure
    }

    fn create_dir(&self, path: &Path) -> Result<(), FileError> {
        self.fs
            .create_dir_all(path)
            .map_err(|source| FileError::DirectoryFailed {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Best-effort removal of `files` and then the directory itself.
    fn remove_all(&self, dir: &Path, files: impl Iterator<Item = PathBuf>) {
        for file in files {
            match self.fs.remove_file(&file) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %file.display(), error = %e, "failed to clean up"),
            }
        }
        if let Err(e) = self.fs.remove_dir(dir) {
            warn!(path = %dir.display(), error = %e, "failed to remove directory");
        }
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn stem_str(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "swap_tests.rs"]
mod tests;
