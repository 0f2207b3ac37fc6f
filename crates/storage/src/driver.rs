// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store driver interface.
//!
//! The driver owns everything format-specific: reading a store's header,
//! deciding compatibility, producing mappings, and rewriting records. The
//! migration engine only sequences driver calls and swaps files.

use crate::Diagnostic;
use std::io;
use std::path::{Path, PathBuf};
use sw_core::{
    MappingError, SchemaDescriptor, SchemaInventory, SchemaMapping, StoreKind, StoreMetadata,
};
use thiserror::Error;

/// Errors reported by a store driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compress(String),
    #[error("corrupt store {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
    #[error("unsupported store kind '{0}'")]
    UnsupportedStoreKind(StoreKind),
    #[error(transparent)]
    Mapping(#[from] MappingError),
    #[error("mapping refers to unknown entity {0}")]
    UnknownEntity(String),
    #[error("record {entity}#{id} is invalid: {reason}")]
    ValidationFailed {
        entity: String,
        id: u64,
        reason: String,
    },
}

impl DriverError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        DriverError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Structured context for diagnosing this failure offline.
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            DriverError::Io { path, .. } | DriverError::Corrupt { path, .. } => {
                Some(Diagnostic::Path(path.clone()))
            }
            DriverError::Mapping(MappingError::IncompatibleTypes { entity, field, .. })
            | DriverError::Mapping(MappingError::MissingDefault { entity, field }) => {
                Some(Diagnostic::Field {
                    entity: entity.clone(),
                    field: field.clone(),
                })
            }
            DriverError::Mapping(MappingError::AmbiguousRename { name, .. })
            | DriverError::UnknownEntity(name) => Some(Diagnostic::Entity {
                entity: name.clone(),
            }),
            DriverError::ValidationFailed { entity, id, .. } => Some(Diagnostic::Record {
                entity: entity.clone(),
                id: *id,
            }),
            DriverError::Json(_)
            | DriverError::Compress(_)
            | DriverError::UnsupportedStoreKind(_) => None,
        }
    }
}

/// Format-specific store operations the migration engine depends on.
pub trait StoreDriver: Send + Sync {
    /// Read the header metadata of the store at `store`.
    fn metadata_for(&self, store: &Path, kind: &StoreKind) -> Result<StoreMetadata, DriverError>;

    /// Whether a store with `metadata` can be opened with `schema` as-is.
    fn is_compatible(&self, schema: &SchemaDescriptor, metadata: &StoreMetadata) -> bool {
        metadata.matches(schema)
    }

    /// The inventory version a store with `metadata` was written under.
    fn schema_matching_metadata<'a>(
        &self,
        metadata: &StoreMetadata,
        inventory: &'a SchemaInventory,
    ) -> Option<&'a SchemaDescriptor> {
        inventory
            .descriptors()
            .find(|schema| self.is_compatible(schema, metadata))
    }

    /// Write a copy of `store` transformed from `from` to `to` at `destination`.
    ///
    /// Must not modify `store`. Artifacts written for `destination` must share
    /// its file stem.
    fn migrate(
        &self,
        store: &Path,
        kind: &StoreKind,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
        mapping: &SchemaMapping,
        destination: &Path,
    ) -> Result<(), DriverError>;

    /// A hand-written mapping for exactly this pair, if one was registered.
    fn explicit_mapping(
        &self,
        _from: &SchemaDescriptor,
        _to: &SchemaDescriptor,
    ) -> Option<SchemaMapping> {
        None
    }

    fn infer_mapping(
        &self,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
    ) -> Result<SchemaMapping, DriverError> {
        Ok(sw_core::infer_mapping(from, to)?)
    }
}
