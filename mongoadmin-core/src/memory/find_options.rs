// mongoadmin-core/src/memory/find_options.rs
// Projection and sort for the in-memory server

use bson::{Bson, Document};

use crate::document::ID_FIELD;
use crate::value_utils::{as_i64, as_number, compare_for_sort, get_path};

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        other => as_number(other).map(|n| n != 0.0).unwrap_or(true),
    }
}

/// Apply a projection document
///
/// Inclusion mode when any field other than `_id` is included; `_id` is
/// kept unless explicitly excluded. Dotted paths reach into sub-documents
/// and arrays of sub-documents. Included fields keep document order.
pub fn apply_projection(doc: &Document, projection: &Document) -> Document {
    let include_mode = projection
        .iter()
        .any(|(field, flag)| field != ID_FIELD && truthy(flag));
    let keep_id = projection.get(ID_FIELD).map(truthy).unwrap_or(true);

    if include_mode {
        let paths: Vec<&str> = projection
            .iter()
            .filter(|(field, flag)| field.as_str() != ID_FIELD && truthy(flag))
            .map(|(field, _)| field.as_str())
            .collect();
        let mut result = include_paths(doc, &paths);
        if keep_id {
            if let Some(id) = doc.get(ID_FIELD) {
                let mut with_id = Document::new();
                with_id.insert(ID_FIELD, id.clone());
                for (key, value) in result {
                    with_id.insert(key, value);
                }
                result = with_id;
            }
        }
        result
    } else {
        let mut result = doc.clone();
        for (field, flag) in projection {
            if !truthy(flag) {
                remove_path(&mut result, field);
            }
        }
        result
    }
}

fn include_paths(doc: &Document, paths: &[&str]) -> Document {
    let mut result = Document::new();
    for (key, value) in doc {
        if key == ID_FIELD {
            continue;
        }
        if paths.iter().any(|p| *p == key.as_str()) {
            result.insert(key.clone(), value.clone());
            continue;
        }
        let prefix = format!("{}.", key);
        let nested: Vec<&str> = paths.iter().filter_map(|p| p.strip_prefix(&prefix)).collect();
        if nested.is_empty() {
            continue;
        }
        match value {
            Bson::Document(inner) => {
                let projected = include_paths(inner, &nested);
                if !projected.is_empty() {
                    result.insert(key.clone(), projected);
                }
            }
            Bson::Array(items) => {
                let projected: Vec<Bson> = items
                    .iter()
                    .filter_map(|item| match item {
                        Bson::Document(inner) => Some(Bson::Document(include_paths(inner, &nested))),
                        _ => None,
                    })
                    .collect();
                result.insert(key.clone(), projected);
            }
            _ => {}
        }
    }
    result
}

fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Bson::Document(inner)) => remove_path(inner, rest),
            Some(Bson::Array(items)) => {
                for item in items.iter_mut() {
                    if let Bson::Document(inner) = item {
                        remove_path(inner, rest);
                    }
                }
            }
            _ => {}
        },
    }
}

/// Stable sort by a key document such as `{age: -1, name: 1}`
pub fn apply_sort(docs: &mut [Document], sort: &Document) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for (field, direction) in sort {
            let ordering = compare_for_sort(get_path(a, field), get_path(b, field));
            if ordering.is_ne() {
                let descending = as_i64(direction).map(|d| d < 0).unwrap_or(false);
                return if descending { ordering.reverse() } else { ordering };
            }
        }
        std::cmp::Ordering::Equal
    });
}
