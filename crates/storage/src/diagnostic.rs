// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed diagnostic payloads attached to migration failures.

use std::fmt;
use std::path::PathBuf;

/// What a failure was about, beyond its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Entity { entity: String },
    Field { entity: String, field: String },
    Record { entity: String, id: u64 },
    Path(PathBuf),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Entity { entity } => write!(f, "entity {entity}"),
            Diagnostic::Field { entity, field } => write!(f, "field {entity}.{field}"),
            Diagnostic::Record { entity, id } => write!(f, "record {entity}#{id}"),
            Diagnostic::Path(path) => write!(f, "path {}", path.display()),
        }
    }
}
