//! Batch input: YAML item lists, tree flattening, schema validation and
//! staged push directories
//!
//! Everything here runs before the first remote call, so a bad input never
//! leaves anything to roll back.

pub mod flatten;
pub mod schema;
pub mod staged;
pub mod yaml;

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::sync::CatalogItem;

pub use flatten::flatten_items;
pub use schema::{SchemaMode, validate_items};
pub use staged::{discover_item_files, load_staged};
pub use yaml::load_items;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("item {index} ({kind}) does not match the schema: {}", .errors.join("; "))]
    Schema {
        index: usize,
        kind: String,
        errors: Vec<String>,
    },

    /// Every schema failure of a batch
    #[error("{} item(s) failed validation:\n{}", .0.len(), render_all(.0))]
    Invalid(Vec<InputError>),

    #[error("item {index} is neither a flat item nor a product tree (keys: {found})")]
    UnknownType { index: usize, found: String },

    #[error("item {index} is malformed: {message}")]
    Malformed { index: usize, message: String },

    #[error("staged file {path} for item {index}: {reason}")]
    StagedFile {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("invalid built-in schema: {0}")]
    SchemaDefinition(String),
}

fn render_all(errors: &[InputError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten, validate and type a list of raw YAML items
pub fn parse_items(raw: Vec<Value>, mode: SchemaMode) -> Result<Vec<CatalogItem>, InputError> {
    let flat = flatten_items(raw)?;
    validate_items(&flat, mode)?;

    flat.into_iter()
        .enumerate()
        .map(|(index, value)| {
            serde_json::from_value(value).map_err(|e| InputError::Malformed {
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::{Action, EntityKind};
    use serde_json::json;

    #[test]
    fn test_parse_mixed_flat_and_tree() {
        let raw = vec![
            json!({
                "product": {
                    "name": "X", "productCode": "X1", "eloquaCode": "E1",
                    "releases": [{
                        "versionName": "v1", "termsAndConditions": "T",
                        "files": [{"downloadURL": "/a"}]
                    }]
                }
            }),
            json!({
                "type": "product", "action": "delete",
                "metadata": {"name": "Old", "productCode": null, "eloquaCode": "E"}
            }),
        ];

        let items = parse_items(raw, SchemaMode::Direct).unwrap();
        let shape: Vec<_> = items.iter().map(|i| (i.kind, i.action)).collect();
        assert_eq!(
            shape,
            [
                (EntityKind::Product, Action::Create),
                (EntityKind::Version, Action::Create),
                (EntityKind::File, Action::Create),
                (EntityKind::Product, Action::Delete),
            ]
        );
        assert_eq!(items[2].metadata["order"], json!(10));
    }

    #[test]
    fn test_invalid_items_are_reported_together() {
        let raw = vec![
            json!({"type": "product", "action": "create", "metadata": {"name": "X"}}),
            json!({"type": "file", "action": "remove", "metadata": {}}),
        ];

        let err = parse_items(raw, SchemaMode::Direct).unwrap_err();
        let InputError::Invalid(errors) = &err else {
            panic!("expected aggregated errors, got {err}");
        };
        assert_eq!(errors.len(), 2);
        assert!(err.to_string().starts_with("2 item(s) failed validation"));
    }
}
