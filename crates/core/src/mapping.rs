// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema-to-schema mappings and automatic mapping inference.
//!
//! A mapping says, for every destination entity, which source entity feeds it
//! and where each destination field's value comes from. Mappings are either
//! written by hand for a specific pair of versions or inferred from the two
//! descriptors.

use crate::{EntityDef, FieldKind, SchemaDescriptor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("cannot convert {entity}.{field} from {from} to {to}")]
    IncompatibleTypes {
        entity: String,
        field: String,
        from: FieldKind,
        to: FieldKind,
    },
    #[error("new required field {entity}.{field} has no default value")]
    MissingDefault { entity: String, field: String },
    #[error("{name} is claimed by more than one destination: {}", candidates.join(", "))]
    AmbiguousRename {
        /// Entity name, or `Entity.field` for field renames
        name: String,
        candidates: Vec<String>,
    },
}

/// Where a destination field's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Copy the named source field unchanged
    Copy(String),
    /// Copy the named source field, converting its kind
    Convert {
        field: String,
        from: FieldKind,
        to: FieldKind,
    },
    /// Use a constant
    Default(Value),
    /// Leave empty (field is optional)
    Null,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub destination: String,
    pub source: FieldSource,
}

impl FieldMapping {
    pub fn new(destination: impl Into<String>, source: FieldSource) -> Self {
        Self {
            destination: destination.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityMappingKind {
    Copy,
    Rename,
    /// Destination-only entity, starts empty
    Add,
    /// Source-only entity, its records are dropped
    Remove,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMapping {
    pub source: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

impl EntityMapping {
    pub fn transform(
        source: impl Into<String>,
        destination: impl Into<String>,
        fields: Vec<FieldMapping>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            destination: Some(destination.into()),
            fields,
        }
    }

    pub fn added(destination: impl Into<String>) -> Self {
        Self {
            source: None,
            destination: Some(destination.into()),
            fields: Vec::new(),
        }
    }

    pub fn removed(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            destination: None,
            fields: Vec::new(),
        }
    }

    pub fn kind(&self) -> EntityMappingKind {
        match (&self.source, &self.destination) {
            (Some(s), Some(d)) if s == d => EntityMappingKind::Copy,
            (Some(_), Some(_)) => EntityMappingKind::Rename,
            (None, _) => EntityMappingKind::Add,
            (Some(_), None) => EntityMappingKind::Remove,
        }
    }
}

/// Mapping between one specific pair of schema versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    pub source_hash: String,
    pub destination_hash: String,
    pub entities: Vec<EntityMapping>,
}

impl SchemaMapping {
    pub fn between(
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
        entities: Vec<EntityMapping>,
    ) -> Self {
        Self {
            source_hash: from.version_hash(),
            destination_hash: to.version_hash(),
            entities,
        }
    }

    /// True when this mapping was built for exactly `from` → `to`.
    pub fn applies_to(&self, from: &SchemaDescriptor, to: &SchemaDescriptor) -> bool {
        self.source_hash == from.version_hash() && self.destination_hash == to.version_hash()
    }

    pub fn for_destination(&self, entity: &str) -> Option<&EntityMapping> {
        self.entities
            .iter()
            .find(|m| m.destination.as_deref() == Some(entity))
    }
}

/// Infer a mapping from `from` to `to`.
///
/// Entities and fields are matched by name or by renaming id, in either
/// direction so that renames can be undone on a downgrade. Unmatched
/// destination entities are added empty; unmatched source entities are
/// removed.
pub fn infer_mapping(
    from: &SchemaDescriptor,
    to: &SchemaDescriptor,
) -> Result<SchemaMapping, MappingError> {
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
    let mut entities = Vec::with_capacity(to.entities.len());

    for (dest_name, dest_def) in &to.entities {
        let renaming_id = dest_def.renaming_id.as_deref();
        let matched = counterpart(&from.entities, dest_name, renaming_id, |e| {
            e.renaming_id.as_deref()
        });
        let Some(src_name) = matched else {
            entities.push(EntityMapping::added(dest_name));
            continue;
        };
        if let Some(previous) = claimed.insert(src_name, dest_name.as_str()) {
            return Err(MappingError::AmbiguousRename {
                name: src_name.to_string(),
                candidates: vec![previous.to_string(), dest_name.clone()],
            });
        }
        let Some(src_def) = from.entities.get(src_name) else {
            continue;
        };
        let fields = infer_fields(dest_name, src_def, dest_def)?;
        entities.push(EntityMapping::transform(src_name, dest_name, fields));
    }

    for src_name in from.entities.keys() {
        if !claimed.contains_key(src_name.as_str()) {
            entities.push(EntityMapping::removed(src_name));
        }
    }

    Ok(SchemaMapping::between(from, to, entities))
}

fn infer_fields(
    entity: &str,
    src: &EntityDef,
    dest: &EntityDef,
) -> Result<Vec<FieldMapping>, MappingError> {
    let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
    let mut fields = Vec::with_capacity(dest.fields.len());

    for (name, def) in &dest.fields {
        let matched = counterpart(&src.fields, name, def.renaming_id.as_deref(), |f| {
            f.renaming_id.as_deref()
        });
        let source = match matched {
            Some(src_name) => {
                if let Some(previous) = claimed.insert(src_name, name.as_str()) {
                    return Err(MappingError::AmbiguousRename {
                        name: format!("{entity}.{src_name}"),
                        candidates: vec![previous.to_string(), name.clone()],
                    });
                }
                let src_kind = src.fields.get(src_name).map(|f| f.kind).unwrap_or(def.kind);
                if src_kind == def.kind {
                    FieldSource::Copy(src_name.to_string())
                } else if src_kind.converts_to(def.kind) {
                    FieldSource::Convert {
                        field: src_name.to_string(),
                        from: src_kind,
                        to: def.kind,
                    }
                } else {
                    return Err(MappingError::IncompatibleTypes {
                        entity: entity.to_string(),
                        field: name.clone(),
                        from: src_kind,
                        to: def.kind,
                    });
                }
            }
            None => match (&def.default, def.optional) {
                (Some(value), _) => FieldSource::Default(value.clone()),
                (None, true) => FieldSource::Null,
                (None, false) => {
                    return Err(MappingError::MissingDefault {
                        entity: entity.to_string(),
                        field: name.clone(),
                    })
                }
            },
        };
        fields.push(FieldMapping::new(name, source));
    }
    Ok(fields)
}

/// Find the source-side key for a destination `name`.
///
/// Order: the destination's renaming id, the same name, then a source item
/// whose own renaming id is the destination name (a rename being undone).
fn counterpart<'a, T>(
    source: &'a BTreeMap<String, T>,
    name: &str,
    renaming_id: Option<&str>,
    renaming_of: impl Fn(&T) -> Option<&str>,
) -> Option<&'a str> {
    if let Some(old) = renaming_id {
        if let Some((key, _)) = source.get_key_value(old) {
            return Some(key.as_str());
        }
    }
    if let Some((key, _)) = source.get_key_value(name) {
        return Some(key.as_str());
    }
    source
        .iter()
        .find(|(_, item)| renaming_of(item) == Some(name))
        .map(|(key, _)| key.as_str())
}

#[cfg(test)]
#[path = "mapping_tests.rs"]
mod tests;
