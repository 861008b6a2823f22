//! Full-pointer references.

use crate::document::Document;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Key holding the target collection of a pointer.
pub const REF_KEY: &str = "$ref";
/// Key holding the target id of a pointer.
pub const ID_KEY: &str = "$id";

/// A `(collection, id)` pointer to a document in another collection.
///
/// The persisted shape is the document `{"$ref": collection, "$id": id}`
/// with exactly that key order. Existing stored data depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbRef {
    /// Name of the collection holding the target document.
    pub collection: String,
    /// The target document's `_id`.
    pub id: Value,
}

impl DbRef {
    /// Creates a pointer.
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Converts to the persisted document form.
    pub fn to_value(&self) -> Value {
        Value::Document(
            Document::new()
                .with(REF_KEY, self.collection.clone())
                .with(ID_KEY, self.id.clone()),
        )
    }

    /// Parses the persisted document form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidDbRef`] if the value is not a document
    /// or either key is missing.
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        let doc = value
            .as_document()
            .ok_or_else(|| CodecError::invalid_dbref(format!("expected document, got {}", value.type_name())))?;
        let collection = doc
            .get(REF_KEY)
            .and_then(Value::as_text)
            .ok_or_else(|| CodecError::invalid_dbref("missing $ref"))?;
        let id = doc
            .get(ID_KEY)
            .ok_or_else(|| CodecError::invalid_dbref("missing $id"))?;
        Ok(Self::new(collection, id.clone()))
    }

    /// Returns true if the value has the pointer shape.
    pub fn is_dbref(value: &Value) -> bool {
        value
            .as_document()
            .is_some_and(|d| d.contains_key(REF_KEY) && d.contains_key(ID_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape() {
        let ptr = DbRef::new("users", 212i64);
        let value = ptr.to_value();
        let doc = value.as_document().unwrap();
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(keys, vec!["$ref", "$id"]);
        assert_eq!(doc.get("$ref"), Some(&Value::from("users")));
        assert_eq!(doc.get("$id"), Some(&Value::Integer(212)));
        assert!(DbRef::is_dbref(&value));
        assert_eq!(DbRef::from_value(&value).unwrap(), ptr);
    }

    #[test]
    fn rejects_malformed_pointers() {
        assert!(DbRef::from_value(&Value::Integer(1)).is_err());
        let missing_id = Value::Document(Document::new().with("$ref", "users"));
        assert!(matches!(
            DbRef::from_value(&missing_id),
            Err(CodecError::InvalidDbRef { .. })
        ));
        assert!(!DbRef::is_dbref(&missing_id));
    }
}
