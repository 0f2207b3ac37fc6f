// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ordered inventory of every schema version a store may have been written under.
//!
//! Order is the inventory's declared order: position 0 is the oldest version
//! and the last entry is the current one. Versions are never compared by name.
//!
//! On disk an inventory is a directory holding `inventory.toml`:
//!
//! ```toml
//! [[version]]
//! name = "Model 1"
//! file = "model_1.toml"
//! ```
//!
//! plus one TOML schema file per version.

use crate::SchemaDescriptor;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the inventory index inside an inventory directory.
pub const INVENTORY_FILE: &str = "inventory.toml";

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("schema version '{0}' is listed more than once")]
    DuplicateVersion(String),
    #[error("schema versions '{first}' and '{second}' are identical; set hash_modifier on one of them")]
    DuplicateIdentity { first: String, second: String },
    #[error("inventory lists no schema versions")]
    Empty,
}

/// A named position in the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaVersion {
    pub name: String,
    pub position: usize,
}

#[derive(Debug, Deserialize)]
struct InventoryIndex {
    #[serde(default)]
    version: Vec<IndexEntry>,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    name: String,
    file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SchemaInventory {
    descriptors: Vec<SchemaDescriptor>,
}

impl SchemaInventory {
    /// Build an inventory from descriptors in version order.
    ///
    /// Names and version hashes must both be unique: stores are matched to
    /// versions by hash, so two identical versions could not be told apart.
    pub fn new(descriptors: Vec<SchemaDescriptor>) -> Result<Self, InventoryError> {
        if descriptors.is_empty() {
            return Err(InventoryError::Empty);
        }
        let mut names = HashSet::new();
        let mut hashes: HashMap<String, &str> = HashMap::new();
        for descriptor in &descriptors {
            if !names.insert(descriptor.name.as_str()) {
                return Err(InventoryError::DuplicateVersion(descriptor.name.clone()));
            }
            if let Some(first) = hashes.insert(descriptor.version_hash(), &descriptor.name) {
                return Err(InventoryError::DuplicateIdentity {
                    first: first.to_string(),
                    second: descriptor.name.clone(),
                });
            }
        }
        Ok(Self { descriptors })
    }

    /// Load an inventory directory (see module docs for the layout).
    pub fn load(dir: &Path) -> Result<Self, InventoryError> {
        let index_path = dir.join(INVENTORY_FILE);
        let index: InventoryIndex = read_toml(&index_path)?;

        let mut descriptors = Vec::with_capacity(index.version.len());
        for entry in index.version {
            let mut descriptor: SchemaDescriptor = read_toml(&dir.join(&entry.file))?;
            descriptor.name = entry.name;
            descriptors.push(descriptor);
        }
        Self::new(descriptors)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptors in inventory order.
    pub fn descriptors(&self) -> impl DoubleEndedIterator<Item = &SchemaDescriptor> + '_ {
        self.descriptors.iter()
    }

    pub fn versions(&self) -> impl Iterator<Item = SchemaVersion> + '_ {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(position, d)| SchemaVersion {
                name: d.name.clone(),
                position,
            })
    }

    pub fn get(&self, position: usize) -> Option<&SchemaDescriptor> {
        self.descriptors.get(position)
    }

    pub fn descriptor_for(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.name == name)
    }

    /// Display name of the inventory version with the same identity as `schema`.
    pub fn name_of(&self, schema: &SchemaDescriptor) -> Option<&str> {
        let hash = schema.version_hash();
        self.descriptors
            .iter()
            .find(|d| d.version_hash() == hash)
            .map(|d| d.name.as_str())
    }

    /// The newest version.
    pub fn current(&self) -> Option<&SchemaDescriptor> {
        self.descriptors.last()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, InventoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| InventoryError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
