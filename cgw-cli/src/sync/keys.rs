//! Natural keys: identity of a catalog record independent of remote IDs

use std::fmt;

use serde_json::Value;

use crate::api::Metadata;

use super::error::SyncError;
use super::types::EntityKind;

/// Ordered tuple of human-meaningful fields identifying one record.
///
/// Products are keyed by `(name, productCode)`, versions by
/// `(productName, productCode, versionName)` and files by
/// `(productName, productCode, versionName, downloadURL)`, so a key's
/// leading components always identify its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    kind: EntityKind,
    parts: Vec<String>,
}

impl NaturalKey {
    /// Build a key, checking the component count for `kind`
    pub fn new(kind: EntityKind, parts: Vec<String>) -> Result<Self, SyncError> {
        if parts.len() != kind.key_arity() {
            return Err(SyncError::KeyArity {
                kind,
                expected: kind.key_arity(),
                actual: parts.len(),
            });
        }
        Ok(Self { kind, parts })
    }

    pub fn product(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Product,
            parts: vec![name.into(), code.into()],
        }
    }

    /// Read the key fields of `kind` from item metadata.
    /// `null` is a legal value (the Gateway allows a null product code).
    pub fn from_metadata(kind: EntityKind, metadata: &Metadata) -> Result<Self, SyncError> {
        let parts = kind
            .key_fields()
            .iter()
            .map(|field| {
                metadata
                    .get(*field)
                    .map(key_part)
                    .ok_or(SyncError::MissingField { kind, field })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kind, parts)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Leading components naming the parent scope (empty for products)
    pub fn scope(&self) -> &[String] {
        &self.parts[..self.parts.len() - 1]
    }

    /// Key of the parent record (version for a file, product for a version)
    pub fn parent(&self) -> Option<NaturalKey> {
        self.kind.parent().map(|kind| NaturalKey {
            kind,
            parts: self.scope().to_vec(),
        })
    }

    /// Key of the product this record lives under
    pub fn product_key(&self) -> NaturalKey {
        NaturalKey {
            kind: EntityKind::Product,
            parts: self.parts[..2].to_vec(),
        }
    }

    /// Extend this key with a child component
    pub fn child(&self, leaf: impl Into<String>) -> Result<NaturalKey, SyncError> {
        let kind = match self.kind {
            EntityKind::Product => EntityKind::Version,
            EntityKind::Version => EntityKind::File,
            EntityKind::File => {
                return Err(SyncError::KeyArity {
                    kind: EntityKind::File,
                    expected: EntityKind::File.key_arity(),
                    actual: self.parts.len() + 1,
                });
            }
        };
        let mut parts = self.parts.clone();
        parts.push(leaf.into());
        Ok(NaturalKey { kind, parts })
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .kind
            .key_labels()
            .iter()
            .zip(&self.parts)
            .map(|(label, part)| match part.as_str() {
                NULL_PART => format!("{}: null", label),
                part => format!("{}: '{}'", label, part),
            })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// Key component standing for a `null` field. Never equal to a string
/// value read from YAML, so `null` and `""` stay distinct keys.
pub const NULL_PART: &str = "\u{0}";

/// Normalize a metadata value into a key component
pub fn key_part(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NULL_PART.to_string(),
        other => other.to_string(),
    }
}
