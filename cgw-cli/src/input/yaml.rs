//! YAML item lists

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::schema::SchemaMode;
use super::{InputError, parse_items};
use crate::sync::CatalogItem;

/// Read a YAML file holding a list of raw items.
///
/// Only the first document of a multi-document stream is used. A file with
/// no document, or an empty one, is an empty list.
pub fn read_documents(path: &Path) -> Result<Vec<Value>, InputError> {
    let text = fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = match serde_yaml::Deserializer::from_str(&text).next() {
        Some(document) => Value::deserialize(document).map_err(|source| InputError::Yaml {
            path: path.to_path_buf(),
            source,
        })?,
        None => Value::Null,
    };

    match value {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(InputError::Malformed {
            index: 0,
            message: format!(
                "{} must contain a list of items, found {}",
                path.display(),
                json_type(&other)
            ),
        }),
    }
}

/// Load, flatten and validate the items of a push file
pub fn load_items(path: &Path) -> Result<Vec<CatalogItem>, InputError> {
    let raw = read_documents(path)?;
    log::debug!("read {} raw item(s) from {}", raw.len(), path.display());
    parse_items(raw, SchemaMode::Direct)
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_flat_items() {
        let file = yaml_file(
            r#"
- type: product
  action: create
  metadata:
    name: X
    productCode: X1
    eloquaCode: E1
- type: product_version
  action: update
  metadata:
    productName: X
    productCode: X1
    versionName: 1.0
    termsAndConditions: T
"#,
        );

        let items = load_items(file.path()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].natural_key().unwrap().parts()[2], "1.0");
    }

    #[test]
    fn test_empty_document_is_empty_batch() {
        let file = yaml_file("");
        assert!(read_documents(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_only_first_document_is_read() {
        let file = yaml_file(
            "---\n- type: product\n  action: create\n  metadata: {name: X}\n---\n- other\n- more\n",
        );
        let items = read_documents(file.path()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["metadata"]["name"], "X");

        let file = yaml_file("---\n---\n- ignored\n");
        assert!(read_documents(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_mapping_at_top_level_is_rejected() {
        let file = yaml_file("type: product\n");
        let err = read_documents(file.path()).unwrap_err();
        assert!(err.to_string().contains("found mapping"));
    }

    #[test]
    fn test_broken_yaml_and_missing_file() {
        let file = yaml_file("- type: [unclosed\n");
        assert!(matches!(
            read_documents(file.path()),
            Err(InputError::Yaml { .. })
        ));
        assert!(matches!(
            read_documents(Path::new("/nonexistent/cgw.yaml")),
            Err(InputError::Io { .. })
        ));
    }
}
