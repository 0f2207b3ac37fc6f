// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-core: schema model, version inventory, and migration planning for Stepwise

pub mod id;
pub mod inventory;
pub mod mapping;
pub mod metadata;
pub mod path;
pub mod schema;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use inventory::{InventoryError, SchemaInventory, SchemaVersion};
pub use mapping::{
    infer_mapping, EntityMapping, EntityMappingKind, FieldMapping, FieldSource, MappingError,
    SchemaMapping,
};
pub use metadata::{StoreKind, StoreMetadata};
pub use path::{resolve_path, route, Direction, MigrationPath, PathError, Route};
pub use schema::{EntityDef, FieldDef, FieldKind, SchemaDescriptor};
