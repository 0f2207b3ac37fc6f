// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration path resolution.
//!
//! A path is the inclusive run of inventory versions between the store's
//! current schema and the target schema. It always starts at the source and
//! ends at the target; for a downgrade the inventory run is reversed.
//! Adjacent path entries are always adjacent in the inventory.

use crate::{SchemaDescriptor, SchemaInventory};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Why no path with at least two versions could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("source and target are the same schema version ({0})")]
    SameVersion(String),
    #[error("source schema {0} is not in the inventory")]
    SourceMissing(String),
    #[error("target schema {0} is not in the inventory")]
    TargetMissing(String),
    #[error("neither source {source_name} nor target {target_name} is in the inventory")]
    BothMissing {
        source_name: String,
        target_name: String,
    },
    #[error("store metadata matches no schema version in the inventory")]
    SourceUnresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Upgrade: inventory order
    Forward,
    /// Downgrade: reverse inventory order
    Backward,
}

/// Result of the single inventory scan.
///
/// Ranges are inventory positions, always `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Forward(RangeInclusive<usize>),
    Backward(RangeInclusive<usize>),
    NotFound {
        source: Option<usize>,
        target: Option<usize>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Source,
    Target,
}

/// Scan the inventory once for `source` and `target`.
///
/// The first version matching either endpoint opens the range; the first
/// later version matching the other endpoint closes it and ends the scan.
/// Repeated matches of the opening endpoint are ignored.
pub fn route(
    inventory: &SchemaInventory,
    source: &SchemaDescriptor,
    target: &SchemaDescriptor,
) -> Route {
    let source_hash = source.version_hash();
    let target_hash = target.version_hash();
    let mut opened: Option<(usize, Endpoint)> = None;

    for (position, descriptor) in inventory.descriptors().enumerate() {
        let hash = descriptor.version_hash();
        let is_source = hash == source_hash;
        let is_target = hash == target_hash;

        match opened {
            None if is_source && is_target => {
                return Route::NotFound {
                    source: Some(position),
                    target: Some(position),
                };
            }
            None if is_source => opened = Some((position, Endpoint::Source)),
            None if is_target => opened = Some((position, Endpoint::Target)),
            Some((start, Endpoint::Source)) if is_target => {
                return Route::Forward(start..=position);
            }
            Some((start, Endpoint::Target)) if is_source => {
                return Route::Backward(start..=position);
            }
            _ => {}
        }
    }

    match opened {
        Some((position, Endpoint::Source)) => Route::NotFound {
            source: Some(position),
            target: None,
        },
        Some((position, Endpoint::Target)) => Route::NotFound {
            source: None,
            target: Some(position),
        },
        None => Route::NotFound {
            source: None,
            target: None,
        },
    }
}

/// Ordered, inclusive run of schema versions from source to target.
#[derive(Debug, Clone)]
pub struct MigrationPath<'a> {
    direction: Direction,
    schemas: Vec<&'a SchemaDescriptor>,
}

impl<'a> MigrationPath<'a> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of versions, endpoints included. Always at least 2.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn schemas(&self) -> &[&'a SchemaDescriptor] {
        &self.schemas
    }

    pub fn source(&self) -> &'a SchemaDescriptor {
        self.schemas[0]
    }

    pub fn target(&self) -> &'a SchemaDescriptor {
        self.schemas[self.schemas.len() - 1]
    }

    /// Adjacent `(from, to)` pairs in the order they must be applied.
    pub fn steps(&self) -> impl Iterator<Item = (&'a SchemaDescriptor, &'a SchemaDescriptor)> + '_ {
        self.schemas.windows(2).map(|pair| (pair[0], pair[1]))
    }

    /// Display names of every version on the path.
    pub fn names(&self) -> Vec<&'a str> {
        self.schemas.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Resolve the path from `source` to `target` through `inventory`.
pub fn resolve_path<'a>(
    source: &SchemaDescriptor,
    target: &SchemaDescriptor,
    inventory: &'a SchemaInventory,
) -> Result<MigrationPath<'a>, PathError> {
    let (direction, range) = match route(inventory, source, target) {
        Route::Forward(range) => (Direction::Forward, range),
        Route::Backward(range) => (Direction::Backward, range),
        Route::NotFound {
            source: Some(s),
            target: Some(t),
        } if s == t => return Err(PathError::SameVersion(display(inventory, s, source))),
        Route::NotFound { source: None, target: None } => {
            return Err(PathError::BothMissing {
                source_name: source.name.clone(),
                target_name: target.name.clone(),
            })
        }
        Route::NotFound { source: None, .. } => {
            return Err(PathError::SourceMissing(source.name.clone()))
        }
        Route::NotFound { .. } => return Err(PathError::TargetMissing(target.name.clone())),
    };

    let mut schemas: Vec<&'a SchemaDescriptor> = range.filter_map(|i| inventory.get(i)).collect();
    if direction == Direction::Backward {
        schemas.reverse();
    }
    Ok(MigrationPath { direction, schemas })
}

fn display(inventory: &SchemaInventory, position: usize, fallback: &SchemaDescriptor) -> String {
    inventory
        .get(position)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| fallback.name.clone())
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
