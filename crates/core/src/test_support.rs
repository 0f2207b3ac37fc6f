// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared schema fixtures for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{EntityDef, FieldDef, FieldKind, SchemaDescriptor, SchemaInventory};

/// Schema for "Model `n`": an `Item` entity with a required `name` plus one
/// optional `note_k` field for every `k` in `2..=n`. Each version has a
/// distinct identity and adjacent versions map onto each other automatically.
pub fn numbered_model(n: usize) -> SchemaDescriptor {
    let mut item = EntityDef::new().field("name", FieldDef::new(FieldKind::String));
    for k in 2..=n {
        item = item.field(format!("note_{k}"), FieldDef::new(FieldKind::String).optional());
    }
    SchemaDescriptor::new(format!("Model {n}")).entity("Item", item)
}

/// Inventory of "Model 1" through "Model `len`".
#[allow(clippy::expect_used)]
pub fn numbered_inventory(len: usize) -> SchemaInventory {
    SchemaInventory::new((1..=len).map(numbered_model).collect())
        .expect("numbered models have unique names")
}
