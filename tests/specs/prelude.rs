//! Test helpers for behavioral tests.
//!
//! Provides a small DSL for migrating real JSON stores on disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use sw_core::test_support::{numbered_inventory, numbered_model};
pub use sw_core::{EntityDef, FieldDef, FieldKind, SchemaDescriptor, SchemaInventory, StoreKind};
pub use sw_storage::{
    JsonStoreDriver, MigrationResult, Migrator, MigratorConfig, Record, StoreContents,
    SwapStrategy, JSON_STORE_KIND,
};

pub const STORE_NAME: &str = "library.store";

pub fn json_kind() -> StoreKind {
    StoreKind::new(JSON_STORE_KIND)
}

/// Entities map from `(entity, records)` pairs.
pub fn entities<const N: usize>(pairs: [(&str, Vec<Record>); N]) -> BTreeMap<String, Vec<Record>> {
    pairs
        .into_iter()
        .map(|(name, records)| (name.to_string(), records))
        .collect()
}

/// An `Item` record valid under "Model `version`", with every note filled in.
pub fn full_item(id: u64, version: usize) -> Record {
    let mut record = Record::new(id).with("name", format!("item {id}"));
    for k in 2..=version {
        record = record.with(format!("note_{k}"), format!("note {k} of {id}"));
    }
    record
}

// =============================================================================
// Project
// =============================================================================

/// Temporary directory holding one store, its scratch area, and an inventory.
pub struct Project {
    dir: tempfile::TempDir,
    inventory: SchemaInventory,
    strategy: SwapStrategy,
}

impl Project {
    pub fn with_inventory(inventory: SchemaInventory) -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            inventory,
            strategy: SwapStrategy::Staged,
        }
    }

    /// Project with a placeholder inventory, for tests that load their own
    pub fn empty() -> Self {
        Self::numbered(1)
    }

    /// Project whose inventory is "Model 1" through "Model `len`"
    pub fn numbered(len: usize) -> Self {
        Self::with_inventory(numbered_inventory(len))
    }

    pub fn strategy(mut self, strategy: SwapStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.path().join("data").join(STORE_NAME)
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.path().join("scratch")
    }

    /// Replace the inventory with the one in `dir` (relative to the project).
    pub fn load_inventory(&mut self, dir: &str) {
        self.inventory = SchemaInventory::load(&self.path().join(dir)).unwrap();
    }

    pub fn inventory(&self) -> &SchemaInventory {
        &self.inventory
    }

    pub fn schema(&self, name: &str) -> &SchemaDescriptor {
        self.inventory
            .descriptor_for(name)
            .unwrap_or_else(|| panic!("{name} is not in the inventory"))
    }

    /// Write a file at the given path (parent directories created automatically)
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Create the store under inventory version `version`.
    pub fn create_store(&self, version: &str, entities: BTreeMap<String, Vec<Record>>) {
        JsonStoreDriver::new()
            .create(&self.store_path(), &json_kind(), self.schema(version), entities)
            .unwrap();
    }

    pub fn config(&self) -> MigratorConfig {
        MigratorConfig {
            scratch_dir: self.scratch_dir(),
            swap_strategy: self.strategy,
        }
    }

    /// Migrate the store to inventory version `target`.
    pub fn migrate_to(&self, target: &str) -> MigrateAssert {
        self.migrate_with(JsonStoreDriver::new(), self.schema(target))
    }

    pub fn migrate_with(&self, driver: JsonStoreDriver, target: &SchemaDescriptor) -> MigrateAssert {
        let result = Migrator::new(driver, &self.config()).iterative_migrate(
            &self.store_path(),
            &json_kind(),
            target,
            &self.inventory,
        );
        MigrateAssert { result }
    }

    pub fn load(&self) -> StoreContents {
        JsonStoreDriver::new()
            .load(&self.store_path(), &json_kind())
            .unwrap()
    }

    /// Names of the schema versions the journal records, oldest first.
    pub fn journal_steps(&self) -> Vec<(String, String)> {
        JsonStoreDriver::new()
            .journal(&self.store_path())
            .unwrap()
            .into_iter()
            .map(|e| (e.from_name, e.to_name))
            .collect()
    }

    /// Sorted file names in `dir` (relative to the project), empty if missing.
    pub fn ls(&self, dir: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.path().join(dir)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Whether the store at `version` is what is on disk now.
    pub fn store_is_at(&self, version: &str) -> bool {
        self.load().metadata.matches(self.schema(version))
    }
}

// =============================================================================
// MigrateAssert
// =============================================================================

pub struct MigrateAssert {
    result: MigrationResult,
}

impl MigrateAssert {
    pub fn result(&self) -> &MigrationResult {
        &self.result
    }

    pub fn messages(&self) -> &[String] {
        &self.result.debug_messages
    }

    pub fn passes(self) -> Self {
        assert!(
            self.result.success,
            "expected success, got failure:\n{}",
            self.result.debug_messages.join("\n")
        );
        self
    }

    pub fn fails(self) -> Self {
        assert!(
            !self.result.success,
            "expected failure, got success:\n{}",
            self.result.debug_messages.join("\n")
        );
        self
    }

    pub fn messages_eq(self, expected: &[&str]) -> Self {
        let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
        similar_asserts::assert_eq!(self.result.debug_messages, expected);
        self
    }

    pub fn message_count(self, expected: usize) -> Self {
        assert_eq!(
            self.result.debug_messages.len(),
            expected,
            "messages:\n{}",
            self.result.debug_messages.join("\n")
        );
        self
    }

    pub fn last_message_has(self, expected: &str) -> Self {
        let last = self.result.debug_messages.last().cloned().unwrap_or_default();
        assert!(
            last.contains(expected),
            "last message should contain {expected:?}, was {last:?}"
        );
        self
    }

    /// `"Migrating from Model a to Model b"` for each adjacent pair in `versions`.
    pub fn steps_through(self, versions: &[usize]) -> Self {
        let expected: Vec<String> = versions
            .windows(2)
            .map(|w| format!("Migrating from Model {} to Model {}", w[0], w[1]))
            .collect();
        similar_asserts::assert_eq!(self.result.debug_messages, expected);
        self
    }
}
