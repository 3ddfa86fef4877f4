//! Product trees to flat items
//!
//! A tree element nests the catalog the way people write it:
//!
//! ```yaml
//! - product:
//!     name: X
//!     productCode: X1
//!     eloquaCode: E1
//!     releases:
//!       - versionName: v1
//!         termsAndConditions: T
//!         files:
//!           - downloadURL: /content/x.iso
//! ```
//!
//! Each node may carry an `action`; nodes without one inherit their
//! parent's, and a product without one is created.

use serde_json::{Map, Value, json};

use super::InputError;

const DEFAULT_ACTION: &str = "create";
const ORDER_STEP: i64 = 10;

/// Expand tree elements in place, leaving flat elements untouched
pub fn flatten_items(raw: Vec<Value>) -> Result<Vec<Value>, InputError> {
    let mut flat = Vec::with_capacity(raw.len());
    for (index, element) in raw.into_iter().enumerate() {
        match element {
            Value::Object(map) if map.contains_key("type") => flat.push(Value::Object(map)),
            Value::Object(mut map) if map.contains_key("product") => {
                let product = map.remove("product").unwrap_or(Value::Null);
                flatten_product(index, product, &mut flat)?;
            }
            Value::Object(map) => {
                return Err(InputError::UnknownType {
                    index,
                    found: map.keys().cloned().collect::<Vec<_>>().join(", "),
                });
            }
            other => {
                return Err(InputError::UnknownType {
                    index,
                    found: super::yaml::json_type(&other).to_string(),
                });
            }
        }
    }
    Ok(flat)
}

fn flatten_product(index: usize, node: Value, out: &mut Vec<Value>) -> Result<(), InputError> {
    let mut product = into_mapping(index, "product", node)?;
    let action = take_action(index, &mut product, DEFAULT_ACTION)?;
    let releases = take_list(index, &mut product, "releases")?;

    let name = product.get("name").cloned().unwrap_or(Value::Null);
    let code = product.get("productCode").cloned().unwrap_or(Value::Null);
    out.push(flat_item("product", &action, product));

    for release in releases {
        let mut version = into_mapping(index, "release", release)?;
        let version_action = take_action(index, &mut version, &action)?;
        let files = take_list(index, &mut version, "files")?;
        let version_name = version.get("versionName").cloned().unwrap_or(Value::Null);

        version.insert("productName".into(), name.clone());
        version.insert("productCode".into(), code.clone());
        out.push(flat_item("product_version", &version_action, version));

        let mut order = 0;
        for node in files {
            let mut file = into_mapping(index, "file", node)?;
            let file_action = take_action(index, &mut file, &version_action)?;
            if !file.contains_key("order") {
                order += ORDER_STEP;
                file.insert("order".into(), order.into());
            }
            file.insert("productName".into(), name.clone());
            file.insert("productCode".into(), code.clone());
            file.insert("productVersionName".into(), version_name.clone());
            out.push(flat_item("file", &file_action, file));
        }
    }
    Ok(())
}

fn flat_item(kind: &str, action: &str, metadata: Map<String, Value>) -> Value {
    json!({"type": kind, "action": action, "metadata": metadata})
}

fn into_mapping(index: usize, what: &str, node: Value) -> Result<Map<String, Value>, InputError> {
    match node {
        Value::Object(map) => Ok(map),
        other => Err(InputError::Malformed {
            index,
            message: format!(
                "{} node must be a mapping, found {}",
                what,
                super::yaml::json_type(&other)
            ),
        }),
    }
}

fn take_action(
    index: usize,
    node: &mut Map<String, Value>,
    inherited: &str,
) -> Result<String, InputError> {
    match node.remove("action") {
        None | Some(Value::Null) => Ok(inherited.to_string()),
        Some(Value::String(action)) => Ok(action),
        Some(other) => Err(InputError::Malformed {
            index,
            message: format!("action must be a string, found {}", other),
        }),
    }
}

fn take_list(
    index: usize,
    node: &mut Map<String, Value>,
    field: &str,
) -> Result<Vec<Value>, InputError> {
    match node.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(list)) => Ok(list),
        Some(other) => Err(InputError::Malformed {
            index,
            message: format!(
                "{} must be a list, found {}",
                field,
                super::yaml::json_type(&other)
            ),
        }),
    }
}
