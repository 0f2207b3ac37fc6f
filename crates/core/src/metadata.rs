// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store header metadata and store kind identifiers.

use crate::SchemaDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

crate::define_id! {
    /// Identifies the on-disk format of a store (e.g. `json`).
    pub struct StoreKind;
}

/// Key under which the schema identity hash is recorded.
pub const SCHEMA_HASH_KEY: &str = "schema_hash";
/// Key under which the schema display name is recorded.
pub const SCHEMA_NAME_KEY: &str = "schema_name";
/// Key under which the store kind is recorded.
pub const STORE_KIND_KEY: &str = "store_kind";
/// Key under which per-entity hashes are recorded.
pub const ENTITY_HASHES_KEY: &str = "entity_hashes";

/// Key/value metadata read from a store header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreMetadata(pub BTreeMap<String, Value>);

impl StoreMetadata {
    /// Metadata describing a store written under `schema`.
    pub fn for_schema(schema: &SchemaDescriptor, kind: &StoreKind) -> Self {
        let mut map = BTreeMap::new();
        map.insert(SCHEMA_HASH_KEY.to_string(), Value::from(schema.version_hash()));
        map.insert(SCHEMA_NAME_KEY.to_string(), Value::from(schema.name.clone()));
        map.insert(STORE_KIND_KEY.to_string(), Value::from(kind.as_str()));
        let entity_hashes = schema
            .entity_hashes()
            .into_iter()
            .map(|(name, hash)| (name, Value::from(hash)))
            .collect();
        map.insert(ENTITY_HASHES_KEY.to_string(), Value::Object(entity_hashes));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn schema_hash(&self) -> Option<&str> {
        self.get(SCHEMA_HASH_KEY).and_then(Value::as_str)
    }

    pub fn schema_name(&self) -> Option<&str> {
        self.get(SCHEMA_NAME_KEY).and_then(Value::as_str)
    }

    pub fn store_kind(&self) -> Option<StoreKind> {
        self.get(STORE_KIND_KEY)
            .and_then(Value::as_str)
            .map(StoreKind::new)
    }

    /// True when the recorded schema hash equals `schema`'s identity.
    pub fn matches(&self, schema: &SchemaDescriptor) -> bool {
        self.schema_hash() == Some(schema.version_hash().as_str())
    }
}
