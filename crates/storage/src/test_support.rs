// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory fakes for migration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::driver::{DriverError, StoreDriver};
use crate::fs::FileSystem;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sw_core::metadata::SCHEMA_HASH_KEY;
use sw_core::{MappingError, SchemaDescriptor, SchemaMapping, StoreKind, StoreMetadata};

// =============================================================================
// FakeFileSystem
// =============================================================================

/// A mutating file-system operation, as recorded by [`FakeFileSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    Write(PathBuf),
    Remove(PathBuf),
    Rename { from: PathBuf, to: PathBuf },
    CreateDir(PathBuf),
    RemoveDir(PathBuf),
}

type RenameFilter = Arc<dyn Fn(&Path, &Path) -> bool + Send + Sync>;

#[derive(Default)]
struct FsState {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    ops: Vec<FsOp>,
    failing_renames: Vec<RenameFilter>,
    failing_removes: BTreeSet<PathBuf>,
}

impl FsState {
    fn add_dir_all(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }

    fn has_children(&self, dir: &Path) -> bool {
        self.files.keys().any(|p| p.parent() == Some(dir))
            || self.dirs.iter().any(|p| p.parent() == Some(dir))
    }
}

/// In-memory file system that logs mutations and supports error injection.
///
/// Clones share state, so a test can keep a handle while the swap helper
/// owns another.
#[derive(Clone, Default)]
pub struct FakeFileSystem {
    state: Arc<Mutex<FsState>>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (and its parent directories) without logging a mutation.
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let path = path.into();
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            state.add_dir_all(parent);
        }
        state.files.insert(path, content.into());
    }

    /// Seed a directory without logging a mutation.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.state.lock().add_dir_all(path.as_ref());
    }

    /// Write a file, logging the mutation. Fails if the parent is missing.
    pub fn write(&self, path: &Path, content: impl Into<Vec<u8>>) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(parent) = path.parent() {
            if !state.dirs.contains(parent) {
                return Err(not_found(parent));
            }
        }
        state.files.insert(path.to_path_buf(), content.into());
        state.ops.push(FsOp::Write(path.to_path_buf()));
        Ok(())
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state.lock().files.get(path.as_ref()).cloned()
    }

    pub fn file_string(&self, path: impl AsRef<Path>) -> Option<String> {
        self.file(path).map(|b| String::from_utf8_lossy(&b).into_owned())
    }

    /// All file paths, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.state.lock().files.keys().cloned().collect()
    }

    /// Files directly inside `dir`, sorted.
    pub fn files_in(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        self.state
            .lock()
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().dirs.contains(path.as_ref())
    }

    /// Every mutation performed so far, in order.
    pub fn mutations(&self) -> Vec<FsOp> {
        self.state.lock().ops.clone()
    }

    pub fn clear_mutations(&self) {
        self.state.lock().ops.clear();
    }

    /// Fail every rename whose destination is `path`.
    pub fn fail_renames_to(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.fail_rename_when(move |_, to| to == path);
    }

    /// Fail every rename whose source is `path`.
    pub fn fail_renames_from(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.fail_rename_when(move |from, _| from == path);
    }

    /// Fail every rename for which `filter(from, to)` holds.
    pub fn fail_rename_when(&self, filter: impl Fn(&Path, &Path) -> bool + Send + Sync + 'static) {
        self.state.lock().failing_renames.push(Arc::new(filter));
    }

    /// Fail every removal of `path`.
    pub fn fail_removes_of(&self, path: impl Into<PathBuf>) {
        self.state.lock().failing_removes.insert(path.into());
    }
}

impl FileSystem for FakeFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.state.lock().files.contains_key(path)
    }

    fn read_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.state.lock();
        if !state.dirs.contains(dir) {
            return Err(not_found(dir));
        }
        let files = state.files.keys().filter(|p| p.parent() == Some(dir));
        let dirs = state.dirs.iter().filter(|p| p.parent() == Some(dir));
        Ok(files.chain(dirs).cloned().collect())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.failing_removes.contains(path) {
            return Err(injected(path));
        }
        if state.files.remove(path).is_none() {
            return Err(not_found(path));
        }
        state.ops.push(FsOp::Remove(path.to_path_buf()));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.failing_renames.iter().any(|f| f(from, to)) {
            return Err(injected(from));
        }
        if let Some(parent) = to.parent() {
            if !state.dirs.contains(parent) {
                return Err(not_found(parent));
            }
        }
        let Some(content) = state.files.remove(from) else {
            return Err(not_found(from));
        };
        state.files.insert(to.to_path_buf(), content);
        state.ops.push(FsOp::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        state.add_dir_all(path);
        state.ops.push(FsOp::CreateDir(path.to_path_buf()));
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        if state.has_children(path) {
            return Err(io::Error::other(format!(
                "directory not empty: {}",
                path.display()
            )));
        }
        state.dirs.remove(path);
        state.ops.push(FsOp::RemoveDir(path.to_path_buf()));
        Ok(())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

fn injected(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("injected failure on {}", path.display()),
    )
}

// =============================================================================
// FakeDriver
// =============================================================================

/// Sidecar suffix written by [`FakeDriver::with_sidecar`].
pub const FAKE_SIDECAR_SUFFIX: &str = "-wal";

#[derive(Default)]
struct DriverState {
    calls: Vec<(String, String)>,
    fail_on_call: Option<usize>,
    fail_inference: bool,
    sidecar: bool,
}

/// Driver over a [`FakeFileSystem`] whose store files hold just the
/// version hash of the schema they were written under.
#[derive(Clone)]
pub struct FakeDriver {
    fs: FakeFileSystem,
    state: Arc<Mutex<DriverState>>,
}

impl FakeDriver {
    pub fn new(fs: FakeFileSystem) -> Self {
        Self {
            fs,
            state: Arc::new(Mutex::new(DriverState::default())),
        }
    }

    /// Also write a `-wal` sidecar next to every migrated store.
    pub fn with_sidecar(self) -> Self {
        self.state.lock().sidecar = true;
        self
    }

    /// Fail the `n`th migrate call (1-based) with a validation error.
    pub fn fail_on_call(self, n: usize) -> Self {
        self.state.lock().fail_on_call = Some(n);
        self
    }

    /// Make every mapping inference fail.
    pub fn fail_inference(self) -> Self {
        self.state.lock().fail_inference = true;
        self
    }

    /// Seed a store at `path` written under `schema`.
    pub fn seed_store(&self, path: impl Into<PathBuf>, schema: &SchemaDescriptor) {
        self.fs.add_file(path, schema.version_hash());
    }

    /// `(from, to)` schema names of every migrate call, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.state.lock().calls.clone()
    }

    /// Hash recorded in the store at `path`.
    pub fn stored_hash(&self, path: impl AsRef<Path>) -> Option<String> {
        self.fs.file_string(path)
    }
}

impl StoreDriver for FakeDriver {
    fn metadata_for(&self, store: &Path, _kind: &StoreKind) -> Result<StoreMetadata, DriverError> {
        let hash = self.fs.file_string(store).ok_or_else(|| {
            DriverError::io(store, io::Error::new(io::ErrorKind::NotFound, "no store"))
        })?;
        let mut metadata = StoreMetadata::default();
        metadata.insert(SCHEMA_HASH_KEY, hash);
        Ok(metadata)
    }

    fn migrate(
        &self,
        store: &Path,
        kind: &StoreKind,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
        _mapping: &SchemaMapping,
        destination: &Path,
    ) -> Result<(), DriverError> {
        let (call, fail_on, sidecar) = {
            let mut state = self.state.lock();
            state.calls.push((from.name.clone(), to.name.clone()));
            (state.calls.len(), state.fail_on_call, state.sidecar)
        };

        if !self.metadata_for(store, kind)?.matches(from) {
            return Err(DriverError::Corrupt {
                path: store.to_path_buf(),
                reason: format!("store is not at schema {}", from.name),
            });
        }
        if fail_on == Some(call) {
            return Err(DriverError::ValidationFailed {
                entity: "Item".to_string(),
                id: 7,
                reason: "injected failure".to_string(),
            });
        }

        self.fs
            .write(destination, to.version_hash())
            .map_err(|e| DriverError::io(destination, e))?;
        if sidecar {
            let mut name = destination.as_os_str().to_os_string();
            name.push(FAKE_SIDECAR_SUFFIX);
            let sidecar = PathBuf::from(name);
            self.fs
                .write(&sidecar, format!("wal for {}", to.name))
                .map_err(|e| DriverError::io(&sidecar, e))?;
        }
        Ok(())
    }

    fn infer_mapping(
        &self,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
    ) -> Result<SchemaMapping, DriverError> {
        if self.state.lock().fail_inference {
            return Err(DriverError::Mapping(MappingError::MissingDefault {
                entity: "Item".to_string(),
                field: "name".to_string(),
            }));
        }
        Ok(sw_core::infer_mapping(from, to)?)
    }
}
