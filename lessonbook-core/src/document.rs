//! Document identifiers and JSON/BSON conversion.
//!
//! Documents travel between clients and the store as JSON objects. The backends work with
//! [`bson::Document`]s, so every document crossing the gateway goes through
//! [`json_to_document`] on the way in and [`document_to_json`] on the way out.

use std::{fmt, str::FromStr};

use bson::{Bson, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Name of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

/// Identifier of a single document in a collection.
///
/// Wraps a 12-byte ObjectId and is rendered to clients as its 24 character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Returns the underlying ObjectId.
    pub fn oid(&self) -> ObjectId {
        self.0
    }

    /// Returns the hex representation of this identifier.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for DocumentId {
    type Err = DocumentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
            .map(DocumentId)
            .map_err(|_| DocumentStoreError::InvalidIdentifier(s.to_string()))
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<ObjectId> for DocumentId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl From<DocumentId> for Bson {
    fn from(id: DocumentId) -> Self {
        Bson::ObjectId(id.0)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(serde::de::Error::custom)
    }
}

/// Serializes a typed record into a BSON document for storage.
///
/// # Errors
///
/// Returns an error if serialization fails or the value does not serialize to a document.
pub fn to_document<T: Serialize>(value: &T) -> DocumentStoreResult<bson::Document> {
    match serialize_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Converts a client supplied JSON object into a BSON document.
///
/// Any non-object value is rejected with [`DocumentStoreError::InvalidDocument`], and so are
/// field names that would be interpreted as store operators.
pub fn json_to_document(value: Value) -> DocumentStoreResult<bson::Document> {
    if !value.is_object() {
        return Err(DocumentStoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        ));
    }

    match serialize_to_bson(&value)? {
        Bson::Document(doc) => {
            validate_field_names(&doc)?;
            Ok(doc)
        }
        _ => Err(DocumentStoreError::InvalidDocument(
            "expected a JSON object".to_string(),
        )),
    }
}

/// Converts a stored BSON document into the JSON shape returned to clients.
///
/// The `_id` field is rendered as a plain hex string.
pub fn document_to_json(mut doc: bson::Document) -> DocumentStoreResult<Value> {
    if let Some(Bson::ObjectId(oid)) = doc.get(ID_FIELD) {
        let hex = oid.to_hex();
        doc.insert(ID_FIELD, hex);
    }

    Ok(deserialize_from_bson::<Value>(Bson::Document(doc))?)
}

/// Checks the top-level field names of a document.
///
/// Names must be non-empty, must not start with `$` and must not contain NUL.
pub fn validate_field_names(doc: &bson::Document) -> DocumentStoreResult<()> {
    for key in doc.keys() {
        if key.is_empty() || key.starts_with('$') || key.contains('\0') {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "invalid field name {key:?}"
            )));
        }
    }

    Ok(())
}

/// Checks that a partial update only names mutable fields.
pub fn validate_partial_update(fields: &bson::Document) -> DocumentStoreResult<()> {
    validate_field_names(fields)?;

    if fields.contains_key(ID_FIELD) {
        return Err(DocumentStoreError::InvalidDocument(
            "the _id field cannot be updated".to_string(),
        ));
    }
    if fields.is_empty() {
        return Err(DocumentStoreError::InvalidDocument(
            "an update must name at least one field".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde_json::json;

    #[test]
    fn parses_hex_identifiers() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_malformed_identifiers() {
        let err = "not-an-id".parse::<DocumentId>().unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidIdentifier(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn json_objects_only() {
        assert!(json_to_document(json!([1, 2, 3])).is_err());
        assert!(json_to_document(json!("lesson")).is_err());

        let doc = json_to_document(json!({ "subject": "Math", "space": 5 })).unwrap();
        assert_eq!(doc.get_str("subject").unwrap(), "Math");
        assert_eq!(doc.get_i64("space").unwrap(), 5);
    }

    #[test]
    fn operator_keys_are_rejected() {
        let err = json_to_document(json!({ "$where": "1 == 1" })).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidDocument(_)));
    }

    #[test]
    fn partial_updates_cannot_touch_id() {
        assert!(validate_partial_update(&doc! { "_id": "abc" }).is_err());
        assert!(validate_partial_update(&doc! {}).is_err());
        assert!(validate_partial_update(&doc! { "space": 4 }).is_ok());
    }

    #[test]
    fn records_serialize_to_documents() {
        #[derive(Serialize)]
        struct Note {
            title: String,
        }

        let doc = to_document(&Note { title: "Math".into() }).unwrap();
        assert_eq!(doc.get_str("title").unwrap(), "Math");
        assert!(to_document(&5).is_err());
    }

    #[test]
    fn ids_render_as_hex() {
        let id = DocumentId::new();
        let value = document_to_json(doc! { "_id": id.oid(), "subject": "Art" }).unwrap();

        assert_eq!(value["_id"], json!(id.to_hex()));
        assert_eq!(value["subject"], json!("Art"));
    }
}
