// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One pairwise migration: `from` schema to the adjacent `to` schema.
//!
//! The driver writes the migrated store to a scratch destination, reading the
//! original only; the swap helper then moves the result over the original.
//! Until the swap starts, a failure leaves the original store untouched.

use crate::driver::{DriverError, StoreDriver};
use crate::fs::FileSystem;
use crate::swap::{FileError, FileSwap};
use crate::Diagnostic;
use std::path::{Path, PathBuf};
use sw_core::{IdGen, SchemaDescriptor, StoreKind};
use thiserror::Error;
use tracing::debug;

/// Errors from a single pairwise migration step
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("scratch destination unavailable: {0}")]
    Scratch(#[source] FileError),
    #[error("no mapping possible from {from} to {to}: {source}")]
    NoMappingPossible {
        from: String,
        to: String,
        #[source]
        source: DriverError,
    },
    #[error("migration from {from} to {to} failed: {source}")]
    MigrationFailed {
        from: String,
        to: String,
        #[source]
        source: DriverError,
    },
    #[error("replacing store after migrating from {from} to {to} failed: {source}")]
    SwapFailed {
        from: String,
        to: String,
        #[source]
        source: FileError,
    },
}

impl MigrationError {
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            MigrationError::Scratch(e) | MigrationError::SwapFailed { source: e, .. } => {
                e.diagnostic()
            }
            MigrationError::NoMappingPossible { source, .. }
            | MigrationError::MigrationFailed { source, .. } => source.diagnostic(),
        }
    }

    /// True when the original store may have been partially replaced.
    pub fn store_may_be_inconsistent(&self) -> bool {
        matches!(self, MigrationError::SwapFailed { .. })
    }
}

pub struct PairwiseStep<'a, D: StoreDriver, F: FileSystem, G: IdGen> {
    driver: &'a D,
    swap: &'a FileSwap<F, G>,
}

impl<'a, D: StoreDriver, F: FileSystem, G: IdGen> PairwiseStep<'a, D, F, G> {
    pub fn new(driver: &'a D, swap: &'a FileSwap<F, G>) -> Self {
        Self { driver, swap }
    }

    /// Migrate the store at `store` from `from` to `to`, returning the
    /// store's location afterwards.
    pub fn run(
        &self,
        store: &Path,
        kind: &StoreKind,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
    ) -> Result<PathBuf, MigrationError> {
        let scratch = self
            .swap
            .make_scratch_destination(store)
            .map_err(MigrationError::Scratch)?;

        let mapping = match self
            .driver
            .explicit_mapping(from, to)
            .filter(|m| m.applies_to(from, to))
        {
            Some(mapping) => {
                debug!(from = %from.name, to = %to.name, "using explicit mapping");
                mapping
            }
            None => self.driver.infer_mapping(from, to).map_err(|source| {
                MigrationError::NoMappingPossible {
                    from: from.name.clone(),
                    to: to.name.clone(),
                    source,
                }
            })?,
        };

        if let Err(source) = self
            .driver
            .migrate(store, kind, from, to, &mapping, &scratch)
        {
            self.swap.discard_scratch(&scratch);
            return Err(MigrationError::MigrationFailed {
                from: from.name.clone(),
                to: to.name.clone(),
                source,
            });
        }

        if let Err(source) = self.swap.replace_store(&scratch, store) {
            self.swap.discard_scratch(&scratch);
            return Err(MigrationError::SwapFailed {
                from: from.name.clone(),
                to: to.name.clone(),
                source,
            });
        }

        debug!(
            store = %store.display(),
            scratch = %scratch.display(),
            "store replaced with migrated copy"
        );
        Ok(store.to_path_buf())
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
