//! JSON-schema validation of flat items (Draft 7)

use jsonschema::{Draft, JSONSchema};
use serde_json::{Value, json};

use super::InputError;

/// Which file schema applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Files carry their final `downloadURL`
    Direct,
    /// Files point at a staged file through `pushItemPath`
    Staged,
}

const ACTIONS: [&str; 3] = ["create", "update", "delete"];

fn envelope(kind: Value, metadata: Value) -> Value {
    json!({
        "type": "object",
        "properties": {
            "type": kind,
            "action": {"type": "string", "enum": ACTIONS},
            "metadata": metadata
        },
        "required": ["type", "action", "metadata"]
    })
}

fn product_schema() -> Value {
    envelope(
        json!({"const": "product"}),
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "productCode": {"type": ["string", "null"]},
                "homepage": {"type": "string"},
                "downloadpage": {"type": "string"},
                "thankYouPage": {"type": "string"},
                "eloquaCode": {"type": ["string", "number"]},
                "featuredArtifactType": {"type": "string"},
                "thankYouTimeout": {"type": "integer"}
            },
            "required": ["name", "productCode", "eloquaCode"]
        }),
    )
}

fn version_schema() -> Value {
    envelope(
        json!({"const": "product_version"}),
        json!({
            "type": "object",
            "properties": {
                "productName": {"type": "string"},
                "productCode": {"type": ["string", "null", "number"]},
                "versionName": {"type": ["string", "number"]},
                "ga": {"type": "boolean"},
                "termsAndConditions": {"type": "string"},
                "trackingDisabled": {"type": "boolean"},
                "hidden": {"type": "boolean"},
                "invisible": {"type": "boolean"},
                "releaseDate": {"type": "string"}
            },
            "required": ["productName", "productCode", "versionName", "termsAndConditions"]
        }),
    )
}

fn file_schema(mode: SchemaMode) -> Value {
    let (location, location_schema) = match mode {
        SchemaMode::Direct => ("downloadURL", json!({"type": "string"})),
        SchemaMode::Staged => ("pushItemPath", json!({"type": "string", "minLength": 1})),
    };
    let mut properties = json!({
        "productName": {"type": "string"},
        "productCode": {"type": ["string", "null"]},
        "productVersionName": {"type": ["string", "number", "null"]},
        "description": {"type": ["string", "null"]},
        "label": {"type": ["string", "null"]},
        "order": {"type": "integer"},
        "hidden": {"type": "boolean"},
        "invisible": {"type": "boolean"},
        "type": {"type": "string"},
        "differentProductThankYouPage": {"type": ["number", "null"]},
        "shortURL": {"type": "string"},
        "size": {"type": ["number", "null"]},
        "md5": {"type": ["string", "number", "null"]}
    });
    properties[location] = location_schema;

    envelope(
        json!({"const": "file"}),
        json!({
            "type": "object",
            "properties": properties,
            "required": ["productName", "productCode", "productVersionName", location]
        }),
    )
}

fn unknown_schema() -> Value {
    envelope(
        json!({"enum": ["product", "product_version", "file"]}),
        json!({"type": "object"}),
    )
}

/// Compiled schemas for one validation run
struct Validators {
    product: JSONSchema,
    version: JSONSchema,
    file: JSONSchema,
    unknown: JSONSchema,
}

impl Validators {
    fn new(mode: SchemaMode) -> Result<Self, InputError> {
        Ok(Self {
            product: compile(&product_schema())?,
            version: compile(&version_schema())?,
            file: compile(&file_schema(mode))?,
            unknown: compile(&unknown_schema())?,
        })
    }

    fn for_kind(&self, kind: &str) -> &JSONSchema {
        match kind {
            "product" => &self.product,
            "product_version" => &self.version,
            "file" => &self.file,
            _ => &self.unknown,
        }
    }
}

fn compile(schema: &Value) -> Result<JSONSchema, InputError> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| InputError::SchemaDefinition(e.to_string()))
}

/// Validate every flat item, collecting all failures before returning
pub fn validate_items(items: &[Value], mode: SchemaMode) -> Result<(), InputError> {
    let validators = Validators::new(mode)?;
    let mut failures = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let kind = item.get("type").and_then(Value::as_str).unwrap_or("unknown");
        if let Err(errors) = validators.for_kind(kind).validate(item) {
            let errors: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            failures.push(InputError::Schema {
                index,
                kind: kind.to_string(),
                errors,
            });
        }
    }

    if failures.is_empty() {
        log::debug!("{} item(s) passed schema validation", items.len());
        Ok(())
    } else {
        Err(InputError::Invalid(failures))
    }
}
