//! JSON record shape of a stored document.
//!
//! Stored object: `{ "ownerId", "title", "content", "createdAt" }`. The legacy
//! key `userId` is read as `ownerId`.

use crate::content::codec;
use crate::model::document::{Document, DocumentId, UserId};
use crate::store::StoreError;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRecord {
    #[serde(alias = "userId")]
    owner_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    created_at: Option<i64>,
}

/// Decodes and validates one stored record.
///
/// # Errors
/// Returns `StoreError::Malformed` for any shape, content or validation failure.
pub fn decode(id: &DocumentId, value: &Value) -> Result<Document, StoreError> {
    let malformed = |reason: String| StoreError::Malformed {
        id: id.clone(),
        reason,
    };

    let record: DocumentRecord =
        serde_json::from_value(value.clone()).map_err(|err| malformed(err.to_string()))?;
    let owner_id = UserId::parse(&record.owner_id).map_err(|err| malformed(err.to_string()))?;
    let content =
        codec::deserialize(record.content.as_ref()).map_err(|err| malformed(err.to_string()))?;

    let document = Document {
        id: id.clone(),
        owner_id,
        title: record.title.unwrap_or_default(),
        content,
        created_at: record.created_at.unwrap_or(0),
    };
    document
        .validate()
        .map_err(|err| malformed(err.to_string()))?;
    Ok(document)
}

/// Encodes one document as its stored record.
pub fn encode(document: &Document) -> Value {
    json!({
        "ownerId": document.owner_id.as_str(),
        "title": document.title,
        "content": codec::serialize(&document.content),
        "createdAt": document.created_at,
    })
}
