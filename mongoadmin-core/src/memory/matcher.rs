// mongoadmin-core/src/memory/matcher.rs
//! Filter matching for the in-memory server
//!
//! Supported:
//! - equality on (dotted) paths, with array membership: `{tags: "a"}`
//! - comparison: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`
//! - sets: `$in`, `$nin`
//! - presence: `$exists`
//! - logical: `$and`, `$or`, `$nor`

use std::cmp::Ordering;

use bson::{Bson, Document};

use crate::error::{AdminError, Result};
use crate::value_utils::{compare_values, get_path, values_equal};

/// Server error code for malformed queries
const BAD_VALUE: i32 = 2;

/// Does `doc` satisfy every clause of `filter`?
pub fn matches_filter(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => clauses(key, condition)?
                .iter()
                .try_fold(true, |acc, f| Ok::<_, AdminError>(acc && matches_filter(doc, f)?))?,
            "$or" => any_clause(doc, clauses(key, condition)?)?,
            "$nor" => !any_clause(doc, clauses(key, condition)?)?,
            op if op.starts_with('$') => {
                return Err(bad_value(format!("unknown top level operator: {}", op)))
            }
            path => matches_condition(get_path(doc, path), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, condition: &'a Bson) -> Result<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(bad_value(format!("{} must be an array", op)));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            _ => Err(bad_value(format!("{} entries must be objects", op))),
        })
        .collect()
}

fn any_clause(doc: &Document, filters: Vec<&Document>) -> Result<bool> {
    for f in filters {
        if matches_filter(doc, f)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// `{$gt: 1, $lt: 5}` style documents, as opposed to literal sub-documents
fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(d) if d.keys().next().map(|k| k.starts_with('$')).unwrap_or(false) => {
            Some(d)
        }
        _ => None,
    }
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let Some(operators) = is_operator_document(condition) else {
        return Ok(equals(value, condition));
    };
    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compares(value, operand, |o| o == Ordering::Greater),
            "$gte" => compares(value, operand, |o| o != Ordering::Less),
            "$lt" => compares(value, operand, |o| o == Ordering::Less),
            "$lte" => compares(value, operand, |o| o != Ordering::Greater),
            "$in" => in_set(value, operand, op)?,
            "$nin" => !in_set(value, operand, op)?,
            "$exists" => {
                let wanted = match operand {
                    Bson::Boolean(b) => *b,
                    other => crate::value_utils::as_number(other).map(|n| n != 0.0).unwrap_or(true),
                };
                value.is_some() == wanted
            }
            other => return Err(bad_value(format!("unknown operator: {}", other))),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality; arrays match when any element does, null matches missing
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(v) if values_equal(v, expected) => true,
        Some(Bson::Array(items)) => items.iter().any(|item| values_equal(item, expected)),
        Some(_) => false,
    }
}

fn compares<F>(value: Option<&Bson>, operand: &Bson, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    let check = |v: &Bson| compare_values(v, operand).map(&accept).unwrap_or(false);
    match value {
        None => false,
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => items.iter().any(check),
        Some(v) => check(v),
    }
}

fn in_set(value: Option<&Bson>, operand: &Bson, op: &str) -> Result<bool> {
    let Bson::Array(candidates) = operand else {
        return Err(bad_value(format!("{} needs an array", op)));
    };
    Ok(candidates.iter().any(|c| equals(value, c)))
}

fn bad_value(message: String) -> AdminError {
    AdminError::command_with_code(BAD_VALUE, message)
}
