//! Stored operation-array codec.
//!
//! Stored shape: `[{ "insert": string | { kind: value }, "attributes"?: { ... } }, ...]`.
//!
//! Decoding never normalizes: adjacent runs are kept apart so a decoded value
//! re-encodes to exactly the stored array. A missing field, `null`, and the
//! empty string all decode to the empty delta.

use crate::model::delta::{Delta, Insert, Op};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stored content that does not match the operation-array shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Top-level value is neither an array nor an accepted empty marker.
    UnexpectedShape(&'static str),
    /// One array element is not a well-formed insert operation.
    InvalidOp { index: usize, reason: String },
    /// JSON text could not be parsed.
    InvalidJson(String),
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedShape(kind) => {
                write!(f, "content must be an operation array, got {kind}")
            }
            Self::InvalidOp { index, reason } => write!(f, "invalid operation #{index}: {reason}"),
            Self::InvalidJson(message) => write!(f, "content is not valid JSON: {message}"),
        }
    }
}

impl Error for ContentError {}

/// Encodes a delta as the stored operation array.
pub fn serialize(delta: &Delta) -> Value {
    Value::Array(delta.ops().iter().map(encode_op).collect())
}

/// Decodes a stored content field; `None` means the field was absent.
pub fn deserialize(value: Option<&Value>) -> Result<Delta, ContentError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Delta::new()),
        Some(Value::String(text)) if text.is_empty() => return Ok(Delta::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(ContentError::UnexpectedShape(json_kind(other))),
    };

    let ops = items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_op(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Delta::from_ops(ops))
}

/// Encodes a delta as compact JSON text (SQLite `content` column).
pub fn to_json_string(delta: &Delta) -> String {
    serialize(delta).to_string()
}

/// Decodes JSON text produced by `to_json_string`; blank text is empty content.
pub fn from_json_str(text: &str) -> Result<Delta, ContentError> {
    if text.trim().is_empty() {
        return Ok(Delta::new());
    }
    let value: Value =
        serde_json::from_str(text).map_err(|err| ContentError::InvalidJson(err.to_string()))?;
    deserialize(Some(&value))
}

fn encode_op(op: &Op) -> Value {
    let mut object = Map::new();
    let insert = match &op.insert {
        Insert::Text(text) => Value::String(text.clone()),
        Insert::Embed(embed) => Value::Object(embed.clone()),
    };
    object.insert("insert".to_string(), insert);
    if let Some(attributes) = &op.attributes {
        object.insert("attributes".to_string(), Value::Object(attributes.clone()));
    }
    Value::Object(object)
}

fn decode_op(index: usize, value: &Value) -> Result<Op, ContentError> {
    let invalid = |reason: String| ContentError::InvalidOp { index, reason };

    let Value::Object(object) = value else {
        return Err(invalid(format!(
            "expected an object, got {}",
            json_kind(value)
        )));
    };

    if let Some(key) = object
        .keys()
        .find(|key| key.as_str() != "insert" && key.as_str() != "attributes")
    {
        return Err(invalid(format!("unexpected key `{key}`")));
    }

    let insert = match object.get("insert") {
        Some(Value::String(text)) if !text.is_empty() => Insert::Text(text.clone()),
        Some(Value::String(_)) => return Err(invalid("text insert is empty".to_string())),
        Some(Value::Object(embed)) if embed.len() == 1 => Insert::Embed(embed.clone()),
        Some(Value::Object(_)) => {
            return Err(invalid("embed must carry exactly one key".to_string()))
        }
        Some(other) => {
            return Err(invalid(format!(
                "insert must be a string or object, got {}",
                json_kind(other)
            )))
        }
        None => return Err(invalid("missing `insert`".to_string())),
    };

    let attributes = match object.get("attributes") {
        None => None,
        Some(Value::Object(attributes)) => Some(attributes.clone()),
        Some(other) => {
            return Err(invalid(format!(
                "attributes must be an object, got {}",
                json_kind(other)
            )))
        }
    };

    Ok(Op { insert, attributes })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{deserialize, from_json_str, serialize, to_json_string, ContentError};
    use crate::model::delta::{Delta, Op};
    use serde_json::json;

    #[test]
    fn absent_null_and_blank_content_are_empty() {
        assert_eq!(deserialize(None).unwrap(), Delta::new());
        assert_eq!(deserialize(Some(&json!(null))).unwrap(), Delta::new());
        assert_eq!(deserialize(Some(&json!(""))).unwrap(), Delta::new());
        assert_eq!(deserialize(Some(&json!([]))).unwrap(), Delta::new());
        assert_eq!(serialize(&Delta::new()), json!([]));
    }

    #[test]
    fn decoding_keeps_adjacent_runs_apart() {
        let stored = json!([{ "insert": "a" }, { "insert": "b" }]);
        let delta = deserialize(Some(&stored)).unwrap();
        assert_eq!(delta.ops(), &[Op::text("a"), Op::text("b")]);
        assert_eq!(serialize(&delta), stored);
    }

    #[test]
    fn rejects_diff_operations_and_bad_inserts() {
        let cases = [
            json!([{ "retain": 3 }]),
            json!([{ "insert": "" }]),
            json!([{ "insert": 5 }]),
            json!([{ "insert": { "image": "a", "video": "b" } }]),
            json!([{ "insert": "x", "attributes": null }]),
            json!(["plain"]),
        ];
        for stored in cases {
            let err = deserialize(Some(&stored)).expect_err("malformed content must fail");
            assert!(matches!(err, ContentError::InvalidOp { index: 0, .. }));
        }
    }

    #[test]
    fn rejects_non_array_content() {
        let err = deserialize(Some(&json!({ "ops": [] }))).unwrap_err();
        assert_eq!(err, ContentError::UnexpectedShape("object"));
        assert!(deserialize(Some(&json!("legacy text"))).is_err());
    }

    #[test]
    fn json_text_helpers_roundtrip() {
        let delta = Delta::from_ops(vec![Op::text("hi"), Op::embed("image", json!("a.png"))]);
        let text = to_json_string(&delta);
        assert_eq!(from_json_str(&text).unwrap(), delta);
        assert_eq!(from_json_str("  ").unwrap(), Delta::new());
        assert!(matches!(
            from_json_str("[{"),
            Err(ContentError::InvalidJson(_))
        ));
    }
}
