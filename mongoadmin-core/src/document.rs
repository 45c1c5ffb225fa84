// mongoadmin-core/src/document.rs
//! Document helpers: JSON text parsing and the small rewrites the facade
//! performs on raw documents.

use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde_json::Value;

use crate::error::{AdminError, Result};

/// Identifier field present in every stored document
pub const ID_FIELD: &str = "_id";

/// Parse JSON text into a document, keeping the field order of the text
///
/// Integers that fit in 32 bits become `Int32`, larger ones `Int64`, other
/// numbers `Double`. `{"$oid": "<hex>"}` becomes an ObjectId.
///
/// # Examples
///
/// ```
/// use mongoadmin_core::document::parse_json_document;
///
/// let keys = parse_json_document(r#"{"b": 1, "a": -1}"#)?;
/// assert_eq!(keys.keys().collect::<Vec<_>>(), vec!["b", "a"]);
/// # Ok::<(), mongoadmin_core::AdminError>(())
/// ```
pub fn parse_json_document(text: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AdminError::Parse(format!("invalid JSON: {}", e)))?;
    match json_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(AdminError::Parse(format!(
            "expected a JSON object, got {:?}",
            other.element_type()
        ))),
    }
}

/// Convert a JSON value into its BSON counterpart
pub fn json_to_bson(value: Value) -> Result<Bson> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => Bson::Int32(small),
                    Err(_) => Bson::Int64(i),
                }
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(
            items
                .into_iter()
                .map(json_to_bson)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(hex)) = map.get("$oid") {
                    let oid = ObjectId::parse_str(hex)
                        .map_err(|e| AdminError::Parse(format!("invalid $oid '{}': {}", hex, e)))?;
                    return Ok(Bson::ObjectId(oid));
                }
            }
            let mut doc = Document::new();
            for (key, value) in map {
                doc.insert(key, json_to_bson(value)?);
            }
            Bson::Document(doc)
        }
    })
}

/// Relaxed extended JSON rendering of a document
pub fn to_json(doc: &Document) -> Value {
    Bson::Document(doc.clone()).into_relaxed_extjson()
}

/// `{_id: <value>}` filter for a document, or `InvalidArgument` without `_id`
pub fn id_filter(doc: &Document) -> Result<Document> {
    let id = doc.get(ID_FIELD).ok_or_else(|| {
        AdminError::InvalidArgument("document has no _id field".to_string())
    })?;
    let mut filter = Document::new();
    filter.insert(ID_FIELD, id.clone());
    Ok(filter)
}

/// Single-field filter `{field: value}`
pub fn field_filter(field: &str, value: impl Into<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value.into());
    filter
}

/// Copy of `doc` with `field` replaced in place
///
/// Every other field keeps its position; when `field` is absent the copy is
/// returned unchanged.
pub fn with_field_replaced(doc: &Document, field: &str, value: Bson) -> Document {
    let mut rebuilt = Document::new();
    for (key, existing) in doc {
        if key == field {
            rebuilt.insert(key.clone(), value.clone());
        } else {
            rebuilt.insert(key.clone(), existing.clone());
        }
    }
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_parse_keeps_order_and_int_widths() {
        let d = parse_json_document(r#"{"z": 1, "a": 5000000000, "m": 1.5}"#).unwrap();
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(d.get("z"), Some(&Bson::Int32(1)));
        assert_eq!(d.get("a"), Some(&Bson::Int64(5_000_000_000)));
        assert_eq!(d.get("m"), Some(&Bson::Double(1.5)));
    }

    #[test]
    fn test_parse_rejects_malformed_and_non_objects() {
        assert!(matches!(parse_json_document("{a:"), Err(AdminError::Parse(_))));
        assert!(matches!(parse_json_document("[1,2]"), Err(AdminError::Parse(_))));
    }

    #[test]
    fn test_parse_object_id() {
        let d = parse_json_document(r#"{"_id": {"$oid": "507f1f77bcf86cd799439011"}}"#).unwrap();
        assert!(matches!(d.get("_id"), Some(Bson::ObjectId(_))));
    }

    #[test]
    fn test_id_filter() {
        assert_eq!(id_filter(&doc! {"_id": 1, "x": 2}).unwrap(), doc! {"_id": 1});
        assert!(matches!(
            id_filter(&doc! {"x": 2}),
            Err(AdminError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_with_field_replaced_keeps_positions() {
        let original = doc! {"v": 1, "key": {"a": 1}, "name": "old", "ns": "t.c"};
        let rebuilt = with_field_replaced(&original, "name", Bson::String("new".into()));
        assert_eq!(rebuilt, doc! {"v": 1, "key": {"a": 1}, "name": "new", "ns": "t.c"});
        assert_eq!(
            rebuilt.keys().collect::<Vec<_>>(),
            original.keys().collect::<Vec<_>>()
        );
    }
}
