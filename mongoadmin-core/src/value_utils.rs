//! Value utility functions shared across modules
//!
//! Nested field access, ordering and numeric coercion for BSON values.

use bson::{Bson, Document};
use std::cmp::Ordering;

/// Get nested value with dot notation support
///
/// Supports:
/// - Simple fields: "name"
/// - Nested documents: "address.city"
/// - Array indexing: "items.0.name"
///
/// # Examples
///
/// ```
/// use bson::{doc, Bson};
/// use mongoadmin_core::value_utils::get_path;
///
/// let doc = doc! {"address": {"city": "NYC"}};
/// assert_eq!(get_path(&doc, "address.city"), Some(&Bson::String("NYC".into())));
/// ```
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    if !path.contains('.') {
        return doc.get(path);
    }

    let mut parts = path.split('.');
    let mut value = doc.get(parts.next()?)?;
    for part in parts {
        match value {
            Bson::Document(inner) => value = inner.get(part)?,
            Bson::Array(arr) => {
                let index = part.parse::<usize>().ok()?;
                value = arr.get(index)?;
            }
            _ => return None,
        }
    }
    Some(value)
}

/// Numeric view of a value, if it has one
pub fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(*i as f64),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        _ => None,
    }
}

/// Integer view of a value; doubles are truncated
pub fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(*i as i64),
        Bson::Int64(i) => Some(*i),
        Bson::Double(f) if f.is_finite() => Some(*f as i64),
        _ => None,
    }
}

/// Rank of a value's type in the server's cross-type sort order
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) => 12,
        Bson::DbPointer(_) => 13,
        Bson::MaxKey => 14,
    }
}

/// Compare two values of the same type class
///
/// Returns `None` for values of different type classes, which query
/// operators treat as "no match".
pub fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total order used for sorting, missing values first
pub fn compare_for_sort(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y)
            .unwrap_or_else(|| type_rank(x).cmp(&type_rank(y))),
    }
}

/// Equality with numeric coercion (`1` == `1.0` == `1i64`)
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_get_path_nested_and_array() {
        let d = doc! {"a": {"b": [10, {"c": "x"}]}};
        assert_eq!(get_path(&d, "a.b.0"), Some(&Bson::Int32(10)));
        assert_eq!(get_path(&d, "a.b.1.c"), Some(&Bson::String("x".into())));
        assert_eq!(get_path(&d, "a.missing"), None);
        assert_eq!(get_path(&d, "a.b.nope"), None);
    }

    #[test]
    fn test_numeric_equality_across_types() {
        assert!(values_equal(&Bson::Int32(1), &Bson::Double(1.0)));
        assert!(values_equal(&Bson::Int64(7), &Bson::Int32(7)));
        assert!(!values_equal(&Bson::Int32(1), &Bson::String("1".into())));
    }

    #[test]
    fn test_compare_for_sort_mixed_types() {
        let n = Bson::Int32(5);
        let s = Bson::String("a".into());
        assert_eq!(compare_for_sort(Some(&n), Some(&s)), Ordering::Less);
        assert_eq!(compare_for_sort(None, Some(&n)), Ordering::Less);
    }
}
