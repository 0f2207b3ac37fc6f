// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the migrator.

use std::path::PathBuf;

/// Overrides the scratch directory migrated copies are written to.
pub const SCRATCH_DIR_VAR: &str = "SW_SCRATCH_DIR";
/// Overrides the swap strategy (`staged` or `in_place`).
pub const SWAP_STRATEGY_VAR: &str = "SW_SWAP_STRATEGY";

pub fn scratch_dir_override() -> Option<PathBuf> {
    std::env::var(SCRATCH_DIR_VAR)
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Raw swap strategy override; parsed by the config layer.
pub fn swap_strategy_override() -> Option<String> {
    std::env::var(SWAP_STRATEGY_VAR)
        .ok()
        .filter(|s| !s.is_empty())
}

/// Scratch directory when nothing overrides it: <system temp>/stepwise
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("stepwise")
}
