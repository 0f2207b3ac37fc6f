// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Iterative store migration.
//!
//! ```text
//! leftover swap dir? ── yes ──→ failure
//!   │ no
//! store exists? ── no ──→ success ("nothing to migrate")
//!   │ yes
//! read metadata ── err ─→ failure
//!   │
//! target compatible? ── yes ──→ success ("no migration necessary")
//!   │ no
//! resolve path ── err ──→ failure ("fewer than 2 versions")
//!   │
//! for (from, to) in path: attempt step ── err ──→ failure, stop
//!   │
//! success
//! ```
//!
//! Steps run strictly in path order and a step only starts after the
//! previous one transformed the data and swapped the files. Callers must
//! not run two migrations against the same store path at once.

use crate::config::MigratorConfig;
use crate::driver::StoreDriver;
use crate::fs::{FileSystem, RealFileSystem};
use crate::step::PairwiseStep;
use crate::swap::FileSwap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sw_core::{
    resolve_path, IdGen, PathError, SchemaDescriptor, SchemaInventory, StoreKind, UuidIdGen,
};
use tracing::{error, info, warn};

/// Name used in messages when a schema is not in the inventory
const UNKNOWN_SCHEMA: &str = "unknown";

/// Outcome of one [`Migrator::iterative_migrate`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    pub success: bool,
    /// Chronological: one entry per attempted step, plus a terminal entry on failure
    pub debug_messages: Vec<String>,
}

impl MigrationResult {
    fn succeeded(debug_messages: Vec<String>) -> Self {
        Self {
            success: true,
            debug_messages,
        }
    }

    fn failed(debug_messages: Vec<String>) -> Self {
        Self {
            success: false,
            debug_messages,
        }
    }
}

/// Migrates stores to a target schema through every intermediate version.
pub struct Migrator<D: StoreDriver, F: FileSystem = RealFileSystem, G: IdGen = UuidIdGen> {
    driver: D,
    swap: FileSwap<F, G>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<D: StoreDriver> Migrator<D> {
    pub fn new(driver: D, config: &MigratorConfig) -> Self {
        Self::with_swap(
            driver,
            FileSwap::new(config.scratch_dir.clone(), config.swap_strategy),
        )
    }
}

impl<D: StoreDriver, F: FileSystem, G: IdGen> Migrator<D, F, G> {
    /// Create a migrator with a custom swap helper (for testing).
    pub fn with_swap(driver: D, swap: FileSwap<F, G>) -> Self {
        Self {
            driver,
            swap,
            cancel: None,
        }
    }

    /// Stop before the next step once `flag` is set. A step already running
    /// is never interrupted.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Bring the store at `store` to `target`, one inventory version at a time.
    pub fn iterative_migrate(
        &self,
        store: &Path,
        kind: &StoreKind,
        target: &SchemaDescriptor,
        inventory: &SchemaInventory,
    ) -> MigrationResult {
        let mut messages = Vec::new();

        match self.swap.interrupted_swap(store) {
            Ok(None) => {}
            Ok(Some(leftover)) => {
                error!(
                    store = %store.display(),
                    leftover = %leftover.display(),
                    "store artifacts left by an interrupted swap"
                );
                messages.push(format!(
                    "Migration failed: an interrupted swap left store artifacts in {}; restore them before migrating",
                    leftover.display()
                ));
                return MigrationResult::failed(messages);
            }
            Err(e) => {
                error!(store = %store.display(), error = %e, "failed to inspect store directory");
                messages.push(format!(
                    "Migration failed: could not inspect the directory of {}: {e}",
                    store.display()
                ));
                return MigrationResult::failed(messages);
            }
        }

        if !self.swap.store_exists(store) {
            info!(store = %store.display(), "no existing store, nothing to migrate");
            messages.push(format!("No store at {}; nothing to migrate", store.display()));
            return MigrationResult::succeeded(messages);
        }

        let metadata = match self.driver.metadata_for(store, kind) {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(store = %store.display(), error = %e, "failed to read store metadata");
                messages.push(format!(
                    "Migration failed: could not read metadata of {}: {e}",
                    store.display()
                ));
                return MigrationResult::failed(messages);
            }
        };

        let target_name = display_name(inventory, target);
        if self.driver.is_compatible(target, &metadata) {
            info!(store = %store.display(), schema = %target_name, "store is current");
            messages.push(format!(
                "No migration necessary: store already matches {target_name}"
            ));
            return MigrationResult::succeeded(messages);
        }

        let path = self
            .driver
            .schema_matching_metadata(&metadata, inventory)
            .ok_or(PathError::SourceUnresolved)
            .and_then(|source| resolve_path(source, target, inventory));
        let path = match path {
            Ok(path) => path,
            Err(e) => {
                warn!(store = %store.display(), error = %e, "migration skipped");
                messages.push(format!(
                    "Migration skipped: fewer than 2 schema versions found ({e})"
                ));
                return MigrationResult::failed(messages);
            }
        };

        info!(
            store = %store.display(),
            from = %display_name(inventory, path.source()),
            to = %target_name,
            steps = path.len() - 1,
            direction = ?path.direction(),
            "migrating store"
        );

        let step = PairwiseStep::new(&self.driver, &self.swap);
        let mut current = store.to_path_buf();
        for (from, to) in path.steps() {
            let from_name = display_name(inventory, from);
            let to_name = display_name(inventory, to);

            if self.is_cancelled() {
                warn!(from = %from_name, to = %to_name, "migration cancelled");
                messages.push(format!(
                    "Migration cancelled before migrating from {from_name} to {to_name}"
                ));
                return MigrationResult::failed(messages);
            }

            info!(from = %from_name, to = %to_name, "migrating");
            messages.push(format!("Migrating from {from_name} to {to_name}"));

            match step.run(&current, kind, from, to) {
                Ok(location) => current = location,
                Err(e) => {
                    error!(
                        from = %from_name,
                        to = %to_name,
                        error = %e,
                        store_may_be_inconsistent = e.store_may_be_inconsistent(),
                        "migration step failed"
                    );
                    let mut message = format!("Migration from {from_name} to {to_name} failed: {e}");
                    if let Some(diagnostic) = e.diagnostic() {
                        message.push_str(&format!(" [{diagnostic}]"));
                    }
                    messages.push(message);
                    return MigrationResult::failed(messages);
                }
            }
        }

        MigrationResult::succeeded(messages)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

fn display_name<'a>(inventory: &'a SchemaInventory, schema: &SchemaDescriptor) -> &'a str {
    inventory.name_of(schema).unwrap_or(UNKNOWN_SCHEMA)
}

#[cfg(test)]
#[path = "migrator_tests.rs"]
mod tests;
