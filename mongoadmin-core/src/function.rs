// mongoadmin-core/src/function.rs
// Stored JavaScript functions in <db>.system.js

use bson::{Bson, Document, JavaScriptCodeWithScope};
use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};

/// `{_id: <name>, value: <code>}`
///
/// Code stored with a scope keeps it, and is written back with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Document>,
}

impl Function {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Function {
            name: name.into(),
            code: code.into(),
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Document) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Fails when `_id` is not a string or `value` holds no code
    pub fn from_document(doc: &Document) -> Result<Self> {
        let name = match doc.get("_id") {
            Some(Bson::String(name)) => name.clone(),
            Some(other) => {
                return Err(AdminError::InvalidArgument(format!(
                    "function _id must be a string, got {:?}",
                    other.element_type()
                )))
            }
            None => {
                return Err(AdminError::InvalidArgument(
                    "function document has no _id".to_string(),
                ))
            }
        };
        let (code, scope) = match doc.get("value") {
            Some(Bson::JavaScriptCode(code)) => (code.clone(), None),
            Some(Bson::JavaScriptCodeWithScope(scoped)) => {
                (scoped.code.clone(), Some(scoped.scope.clone()))
            }
            Some(Bson::String(code)) => (code.clone(), None),
            _ => {
                return Err(AdminError::InvalidArgument(format!(
                    "function '{}' has no code in 'value'",
                    name
                )))
            }
        };
        Ok(Function { name, code, scope })
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("_id", self.name.clone());
        let value = match &self.scope {
            Some(scope) => Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: self.code.clone(),
                scope: scope.clone(),
            }),
            None => Bson::JavaScriptCode(self.code.clone()),
        };
        doc.insert("value", value);
        doc
    }
}

impl TryFrom<&Document> for Function {
    type Error = AdminError;

    fn try_from(doc: &Document) -> Result<Self> {
        Function::from_document(doc)
    }
}

/// Functions read from `system.js`, plus the documents that were skipped
pub type FunctionListing = crate::listing::PartialListing<Function>;

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_round_trip() {
        let f = Function::new("add", "function(a, b) { return a + b; }");
        let doc = f.to_document();
        assert!(matches!(doc.get("value"), Some(Bson::JavaScriptCode(_))));
        assert_eq!(Function::from_document(&doc).unwrap(), f);
    }

    #[test]
    fn test_scope_is_written_back() {
        let stored = doc! {
            "_id": "scaled",
            "value": Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: "function(x) { return x * factor; }".to_string(),
                scope: doc! {"factor": 3},
            }),
        };
        let f = Function::from_document(&stored).unwrap();
        assert_eq!(f.scope, Some(doc! {"factor": 3}));
        assert_eq!(f.to_document(), stored);
    }

    #[test]
    fn test_plain_string_value_accepted() {
        let f = Function::try_from(&doc! {"_id": "f", "value": "function() {}"}).unwrap();
        assert_eq!(f.code, "function() {}");
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(Function::from_document(&doc! {"value": "x"}).is_err());
        assert!(Function::from_document(&doc! {"_id": 5, "value": "x"}).is_err());
        assert!(Function::from_document(&doc! {"_id": "f"}).is_err());
        assert!(Function::from_document(&doc! {"_id": "f", "value": 3}).is_err());
    }
}
