// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-storage: store drivers, artifact swapping, and the iterative migrator for Stepwise

mod config;
mod diagnostic;
mod driver;
mod env;
mod fs;
mod json_store;
mod migrator;
mod step;
mod swap;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, MigratorConfig};
pub use diagnostic::Diagnostic;
pub use driver::{DriverError, StoreDriver};
pub use env::{SCRATCH_DIR_VAR, SWAP_STRATEGY_VAR};
pub use fs::{FileSystem, RealFileSystem};
pub use json_store::{
    journal_path, JournalEntry, JsonStoreDriver, Record, StoreContents, JOURNAL_SUFFIX,
    JSON_STORE_KIND,
};
pub use migrator::{MigrationResult, Migrator};
pub use step::{MigrationError, PairwiseStep};
pub use swap::{FileError, FileSwap, SwapStrategy};
