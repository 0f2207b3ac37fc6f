// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema descriptors and their identity hashes.
//!
//! A descriptor is the loadable form of one schema version: a set of named
//! entities, each with typed fields. Identity is the SHA-256 of a canonical
//! JSON rendering of the entities (plus the optional hash modifier), so two
//! descriptors with the same shape are the same schema regardless of the
//! display name they were loaded under. Renaming ids only guide mapping
//! inference and are excluded from the hash.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Value type of a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Bool,
    /// Id of a record in the entity named by [`FieldDef::target`]
    Reference,
}

impl FieldKind {
    /// Whether a stored JSON value is acceptable for this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Float => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Reference => value.is_u64(),
        }
    }

    /// Whether values of `self` can be converted to `to` without a hand-written mapping.
    pub fn converts_to(&self, to: FieldKind) -> bool {
        match (self, to) {
            (a, b) if *a == b => true,
            (FieldKind::Integer, FieldKind::Float) => true,
            (FieldKind::Integer | FieldKind::Float | FieldKind::Bool, FieldKind::String) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Bool => "bool",
            FieldKind::Reference => "reference",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub kind: FieldKind,
    /// Referenced entity, only meaningful for [`FieldKind::Reference`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Name this field had in the previous version, if it was renamed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renaming_id: Option<String>,
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            target: None,
            optional: false,
            default: None,
            renaming_id: None,
        }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::new(FieldKind::Reference)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn renamed_from(mut self, name: impl Into<String>) -> Self {
        self.renaming_id = Some(name.into());
        self
    }

    fn canonical(&self) -> Value {
        json!({
            "kind": self.kind,
            "target": self.target,
            "optional": self.optional,
            "default": self.default,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Name this entity had in the previous version, if it was renamed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renaming_id: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

impl EntityDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn renamed_from(mut self, name: impl Into<String>) -> Self {
        self.renaming_id = Some(name.into());
        self
    }

    /// SHA-256 over the canonical field set.
    pub fn entity_hash(&self) -> String {
        sha256_hex(&self.canonical())
    }

    fn canonical(&self) -> Value {
        let fields: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, def)| (name.clone(), def.canonical()))
            .collect();
        Value::Object(fields)
    }
}

/// Loadable representation of one schema version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    /// Display name; assigned by the inventory the descriptor was loaded from.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Distinguishes versions whose entities are otherwise identical
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_modifier: Option<String>,
    #[serde(default)]
    pub entities: BTreeMap<String, EntityDef>,
}

impl SchemaDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn entity(mut self, name: impl Into<String>, def: EntityDef) -> Self {
        self.entities.insert(name.into(), def);
        self
    }

    pub fn with_hash_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.hash_modifier = Some(modifier.into());
        self
    }

    /// Identity of this schema. Equal hashes mean the same effective schema.
    pub fn version_hash(&self) -> String {
        let entities: Map<String, Value> = self
            .entities
            .iter()
            .map(|(name, def)| (name.clone(), def.canonical()))
            .collect();
        sha256_hex(&json!({
            "entities": entities,
            "hash_modifier": self.hash_modifier,
        }))
    }

    /// Per-entity hashes, keyed by entity name.
    pub fn entity_hashes(&self) -> BTreeMap<String, String> {
        self.entities
            .iter()
            .map(|(name, def)| (name.clone(), def.entity_hash()))
            .collect()
    }

    /// Same effective schema identity, ignoring display names.
    pub fn same_schema(&self, other: &SchemaDescriptor) -> bool {
        self.version_hash() == other.version_hash()
    }
}

fn sha256_hex(value: &Value) -> String {
    // serde_json::Map is a BTreeMap without `preserve_order`, so keys are sorted
    let canonical = value.to_string();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
