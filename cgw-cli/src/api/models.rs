//! Wire-level types shared by the client and the sync engine

use serde_json::{Map, Value};

use super::error::ClientError;

/// Remote-assigned numeric identifier
pub type RecordId = u64;

/// Attribute map sent to the Gateway for a single record
pub type Metadata = Map<String, Value>;

/// A record as returned by the Gateway
pub type Record = Map<String, Value>;

/// Extract the record ID from a create response.
///
/// The Gateway answers a create either with the bare ID or with the stored
/// record; both shapes are accepted.
pub fn parse_record_id(value: &Value) -> Result<RecordId, ClientError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ClientError::Decode(format!("record id is not an unsigned integer: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ClientError::Decode(format!("record id is not numeric: {:?}", s))),
        Value::Object(obj) => match obj.get("id") {
            Some(id) => parse_record_id(id),
            None => Err(ClientError::Decode("response object has no 'id' field".to_string())),
        },
        other => Err(ClientError::Decode(format!("cannot read record id from {}", other))),
    }
}

/// Read the `id` field of a listed record
pub fn record_id(record: &Record) -> Option<RecordId> {
    record.get("id").and_then(|id| parse_record_id(id).ok())
}

/// Convert a response body into a list of records
pub fn into_records(value: Value) -> Result<Vec<Record>, ClientError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(obj) => Ok(obj),
                other => Err(ClientError::Decode(format!("expected an object, got {}", other))),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(ClientError::Decode(format!("expected a list, got {}", other))),
    }
}

/// Convert a response body into a single record
pub fn into_record(value: Value) -> Result<Record, ClientError> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(ClientError::Decode(format!("expected an object, got {}", other))),
    }
}
