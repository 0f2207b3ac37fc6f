// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! zstd-compressed JSON store driver.
//!
//! A store is two artifacts sharing a stem:
//!
//! - `<name>.<ext>`: zstd-compressed JSON `{ "metadata": {..}, "entities": {..} }`
//! - `<name>.<ext>-journal`: JSON lines, one entry per migration applied
//!
//! Migration reads the source store, applies the mapping entity by entity,
//! validates the result against the destination schema, and writes both
//! artifacts at the destination. The source is only ever read.

use crate::driver::{DriverError, StoreDriver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use sw_core::{
    FieldKind, FieldSource, SchemaDescriptor, SchemaMapping, StoreKind, StoreMetadata,
};
use tracing::debug;

/// Store kind handled by [`JsonStoreDriver`].
pub const JSON_STORE_KIND: &str = "json";

/// Appended to the store's file name to form the journal sidecar.
pub const JOURNAL_SUFFIX: &str = "-journal";

/// One stored entity instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Decoded contents of a store file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreContents {
    pub metadata: StoreMetadata,
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<Record>>,
}

impl StoreContents {
    pub fn records(&self, entity: &str) -> &[Record] {
        self.entities.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, entity: &str) -> usize {
        self.records(entity).len()
    }
}

/// One applied migration, as recorded in the journal sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub from_hash: String,
    pub to_hash: String,
    pub from_name: String,
    pub to_name: String,
    pub migrated_at: DateTime<Utc>,
}

/// Path of the journal sidecar for `store`.
pub fn journal_path(store: &Path) -> PathBuf {
    let mut name = store
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(JOURNAL_SUFFIX);
    store.with_file_name(name)
}

pub struct JsonStoreDriver {
    mappings: Vec<SchemaMapping>,
    compression_level: i32,
}

impl Default for JsonStoreDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStoreDriver {
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
            // same default level as snapshot checkpoints
            compression_level: 3,
        }
    }

    /// Register a hand-written mapping; it wins over inference for its pair.
    pub fn with_mapping(mut self, mapping: SchemaMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Set the zstd compression level (1-22, default 3).
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Create a new store under `schema` holding `entities`.
    pub fn create(
        &self,
        path: &Path,
        kind: &StoreKind,
        schema: &SchemaDescriptor,
        entities: BTreeMap<String, Vec<Record>>,
    ) -> Result<(), DriverError> {
        check_kind(kind)?;
        let mut entities = entities;
        validate(schema, &entities)?;
        check_references(schema, &mut entities, false)?;

        let contents = StoreContents {
            metadata: StoreMetadata::for_schema(schema, kind),
            entities,
        };
        self.write_contents(path, &contents)?;
        write_journal(&journal_path(path), &[])
    }

    /// Read and decode the whole store.
    pub fn load(&self, path: &Path, kind: &StoreKind) -> Result<StoreContents, DriverError> {
        check_kind(kind)?;
        let file = File::open(path).map_err(|e| DriverError::io(path, e))?;
        let decoder = zstd::stream::read::Decoder::new(file)
            .map_err(|e| DriverError::Compress(e.to_string()))?;
        serde_json::from_reader(decoder).map_err(|e| DriverError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Migration history recorded next to `path`. Empty if there is no journal.
    pub fn journal(&self, path: &Path) -> Result<Vec<JournalEntry>, DriverError> {
        let journal = journal_path(path);
        if !journal.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&journal).map_err(|e| DriverError::io(&journal, e))?;
        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DriverError::io(&journal, e))?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    fn write_contents(&self, path: &Path, contents: &StoreContents) -> Result<(), DriverError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DriverError::io(parent, e))?;
        }
        let json = serde_json::to_vec(contents)?;
        let compressed = zstd::encode_all(json.as_slice(), self.compression_level)
            .map_err(|e| DriverError::Compress(e.to_string()))?;

        let mut file = File::create(path).map_err(|e| DriverError::io(path, e))?;
        file.write_all(&compressed)
            .and_then(|_| file.sync_all())
            .map_err(|e| DriverError::io(path, e))
    }
}

impl StoreDriver for JsonStoreDriver {
    fn metadata_for(&self, store: &Path, kind: &StoreKind) -> Result<StoreMetadata, DriverError> {
        Ok(self.load(store, kind)?.metadata)
    }

    fn migrate(
        &self,
        store: &Path,
        kind: &StoreKind,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
        mapping: &SchemaMapping,
        destination: &Path,
    ) -> Result<(), DriverError> {
        let source = self.load(store, kind)?;
        if !source.metadata.matches(from) {
            return Err(DriverError::Corrupt {
                path: store.to_path_buf(),
                reason: format!("store is not at schema {}", from.name),
            });
        }

        let mut entities = transform(&source, to, mapping)?;
        check_references(to, &mut entities, true)?;
        validate(to, &entities)?;
        for (entity, records) in &entities {
            debug!(entity = %entity, records = records.len(), to = %to.name, "migrated entity");
        }

        let contents = StoreContents {
            metadata: StoreMetadata::for_schema(to, kind),
            entities,
        };
        self.write_contents(destination, &contents)?;

        let mut journal = self.journal(store)?;
        journal.push(JournalEntry {
            from_hash: from.version_hash(),
            to_hash: to.version_hash(),
            from_name: from.name.clone(),
            to_name: to.name.clone(),
            migrated_at: Utc::now(),
        });
        write_journal(&journal_path(destination), &journal)
    }

    fn explicit_mapping(
        &self,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
    ) -> Option<SchemaMapping> {
        self.mappings.iter().find(|m| m.applies_to(from, to)).cloned()
    }
}

fn check_kind(kind: &StoreKind) -> Result<(), DriverError> {
    if kind.as_str() == JSON_STORE_KIND {
        Ok(())
    } else {
        Err(DriverError::UnsupportedStoreKind(kind.clone()))
    }
}

fn write_journal(path: &Path, entries: &[JournalEntry]) -> Result<(), DriverError> {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }
    std::fs::write(path, out).map_err(|e| DriverError::io(path, e))
}

/// Build the destination entities from `source` according to `mapping`.
fn transform(
    source: &StoreContents,
    to: &SchemaDescriptor,
    mapping: &SchemaMapping,
) -> Result<BTreeMap<String, Vec<Record>>, DriverError> {
    let mut entities = BTreeMap::new();

    for (name, def) in &to.entities {
        let entity_mapping = mapping.for_destination(name);
        let Some(src_name) = entity_mapping.and_then(|m| m.source.as_deref()) else {
            entities.insert(name.clone(), Vec::new());
            continue;
        };
        let field_sources: BTreeMap<&str, &FieldSource> = entity_mapping
            .map(|m| {
                m.fields
                    .iter()
                    .map(|f| (f.destination.as_str(), &f.source))
                    .collect()
            })
            .unwrap_or_default();

        let mut records = Vec::with_capacity(source.count(src_name));
        for record in source.records(src_name) {
            let mut migrated = Record::new(record.id);
            for (field, field_def) in &def.fields {
                let value = match field_sources.get(field.as_str()) {
                    Some(field_source) => resolve(record, field_source, name, field)?,
                    None => None,
                };
                if let Some(value) = value.or_else(|| field_def.default.clone()) {
                    migrated.fields.insert(field.clone(), value);
                }
            }
            records.push(migrated);
        }
        entities.insert(name.clone(), records);
    }
    Ok(entities)
}

fn resolve(
    record: &Record,
    source: &FieldSource,
    entity: &str,
    field: &str,
) -> Result<Option<Value>, DriverError> {
    match source {
        FieldSource::Copy(name) => Ok(present(record, name).cloned()),
        FieldSource::Convert { field: name, from, to } => match present(record, name) {
            None => Ok(None),
            Some(value) => convert(value, *from, *to).map(Some).ok_or_else(|| {
                DriverError::ValidationFailed {
                    entity: entity.to_string(),
                    id: record.id,
                    reason: format!("cannot convert {field} from {from} to {to}"),
                }
            }),
        },
        FieldSource::Default(value) => Ok(Some(value.clone())),
        FieldSource::Null => Ok(None),
    }
}

fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

fn convert(value: &Value, from: FieldKind, to: FieldKind) -> Option<Value> {
    match (from, to) {
        _ if from == to => Some(value.clone()),
        (FieldKind::Integer, FieldKind::Float) => value.as_f64().map(Value::from),
        (_, FieldKind::String) => match value {
            Value::String(s) => Some(Value::from(s.clone())),
            Value::Number(n) => Some(Value::from(n.to_string())),
            Value::Bool(b) => Some(Value::from(b.to_string())),
            _ => None,
        },
        _ => None,
    }
}

/// Check every record against `schema`: known entities, required fields
/// present, values of the declared kind, no undeclared fields.
fn validate(
    schema: &SchemaDescriptor,
    entities: &BTreeMap<String, Vec<Record>>,
) -> Result<(), DriverError> {
    for (entity, records) in entities {
        let Some(def) = schema.entities.get(entity) else {
            return Err(DriverError::UnknownEntity(entity.clone()));
        };
        let invalid = |id: u64, reason: String| DriverError::ValidationFailed {
            entity: entity.clone(),
            id,
            reason,
        };

        let mut ids = BTreeSet::new();
        for record in records {
            if !ids.insert(record.id) {
                return Err(invalid(record.id, "duplicate id".to_string()));
            }
            for (name, field) in &def.fields {
                match record.get(name) {
                    None | Some(Value::Null) if field.optional => {}
                    None | Some(Value::Null) => {
                        return Err(invalid(record.id, format!("required field {name} is missing")));
                    }
                    Some(value) if !field.kind.accepts(value) => {
                        return Err(invalid(
                            record.id,
                            format!("field {name} expects {}", field.kind),
                        ));
                    }
                    Some(_) => {}
                }
            }
            if let Some(extra) = record.fields.keys().find(|k| !def.fields.contains_key(*k)) {
                return Err(invalid(record.id, format!("undeclared field {extra}")));
            }
        }
    }
    Ok(())
}

/// Reference fields must point at existing records of their target entity.
/// With `prune`, dangling optional references are cleared instead.
fn check_references(
    schema: &SchemaDescriptor,
    entities: &mut BTreeMap<String, Vec<Record>>,
    prune: bool,
) -> Result<(), DriverError> {
    let ids: BTreeMap<String, BTreeSet<u64>> = entities
        .iter()
        .map(|(name, records)| (name.clone(), records.iter().map(|r| r.id).collect()))
        .collect();

    for (entity, records) in entities.iter_mut() {
        let Some(def) = schema.entities.get(entity) else {
            continue;
        };
        for (field, field_def) in &def.fields {
            if field_def.kind != FieldKind::Reference {
                continue;
            }
            let targets = field_def.target.as_ref().and_then(|t| ids.get(t));
            for record in records.iter_mut() {
                let Some(target_id) = record.get(field).and_then(Value::as_u64) else {
                    continue;
                };
                if targets.is_some_and(|t| t.contains(&target_id)) {
                    continue;
                }
                if prune && field_def.optional {
                    record.fields.remove(field);
                    continue;
                }
                return Err(DriverError::ValidationFailed {
                    entity: entity.clone(),
                    id: record.id,
                    reason: format!("{field} refers to missing record {target_id}"),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "json_store_tests.rs"]
mod tests;
