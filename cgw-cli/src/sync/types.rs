//! Catalog items and the vocabulary around them

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{Metadata, RecordId, parse_record_id};

use super::error::SyncError;
use super::keys::NaturalKey;

/// Entity types of the catalog hierarchy (product > version > file)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "product")]
    Product,
    #[serde(rename = "product_version")]
    Version,
    #[serde(rename = "file")]
    File,
}

impl EntityKind {
    /// Metadata fields forming the natural key, in key order
    pub fn key_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Product => &["name", "productCode"],
            Self::Version => &["productName", "productCode", "versionName"],
            Self::File => &["productName", "productCode", "productVersionName", "downloadURL"],
        }
    }

    pub fn key_arity(&self) -> usize {
        self.key_fields().len()
    }

    /// Labels used when printing a key of this kind
    pub fn key_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Product => &["name", "productCode"],
            Self::Version => &["productName", "productCode", "versionName"],
            Self::File => &["productName", "productCode", "versionName", "downloadURL"],
        }
    }

    /// The kind one level up the hierarchy
    pub fn parent(&self) -> Option<EntityKind> {
        match self {
            Self::Product => None,
            Self::Version => Some(Self::Product),
            Self::File => Some(Self::Version),
        }
    }

    /// Capitalized label for messages
    pub fn title(&self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::Version => "Version",
            Self::File => "File",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Version => "product_version",
            Self::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Product => "product",
            Self::Version => "version",
            Self::File => "file",
        };
        f.write_str(label)
    }
}

/// Desired change for a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of desired state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub action: Action,
    pub metadata: Metadata,
}

impl CatalogItem {
    pub fn new(kind: EntityKind, action: Action, metadata: Metadata) -> Self {
        Self {
            kind,
            action,
            metadata,
        }
    }

    /// Build the natural key from this item's metadata
    pub fn natural_key(&self) -> Result<NaturalKey, SyncError> {
        NaturalKey::from_metadata(self.kind, &self.metadata)
    }

    /// An `id` given explicitly in metadata
    pub fn explicit_id(&self) -> Option<RecordId> {
        self.metadata
            .get("id")
            .filter(|v| !v.is_null())
            .and_then(|v| parse_record_id(v).ok())
    }

    /// Visibility the caller asked for; absent means visible
    pub fn requested_invisible(&self) -> bool {
        is_truthy(self.metadata.get("invisible"))
    }

    /// Remove natural-key-only fields once they were translated to IDs
    pub fn strip_fields(&mut self, fields: &[&str]) {
        for field in fields {
            self.metadata.remove(*field);
        }
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) {
        self.metadata.insert(field.to_string(), value.into());
    }
}

/// The Gateway accepts both booleans and 0/1 for flags
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}
