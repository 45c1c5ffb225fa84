// mongoadmin-core/src/user.rs
// Users stored in <db>.system.users

use bson::oid::ObjectId;
use bson::{Bson, Document};

/// Legacy user entry: `{_id, user, pwd, readOnly[, roles]}`
///
/// A user read from the catalog remembers its source document. Saving it
/// back rewrites the modelled fields in place and carries every other
/// field (`customData`, `credentials`, ...) through untouched.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<ObjectId>,
    pub name: String,
    /// MONGODB-CR digest, never the clear-text password
    pub password_hash: String,
    pub read_only: bool,
    /// Role names or `{role, db}` documents, as stored
    pub roles: Vec<Bson>,
    source: Document,
}

impl User {
    /// New user with a fresh identifier and no credential
    pub fn new(name: impl Into<String>) -> Self {
        User {
            id: Some(ObjectId::new()),
            name: name.into(),
            password_hash: String::new(),
            read_only: false,
            roles: Vec::new(),
            source: Document::new(),
        }
    }

    /// New user whose credential is derived from `password`
    pub fn with_password(name: impl Into<String>, password: &str) -> Self {
        let mut user = Self::new(name);
        user.set_password(password);
        user
    }

    /// Replace the credential with the digest of `password`
    pub fn set_password(&mut self, password: &str) {
        self.password_hash = password_digest(&self.name, password);
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Bson>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Names of the granted roles, whichever form they are stored in
    pub fn role_names(&self) -> Vec<&str> {
        self.roles
            .iter()
            .filter_map(|role| match role {
                Bson::String(name) => Some(name.as_str()),
                Bson::Document(d) => d.get_str("role").ok(),
                _ => None,
            })
            .collect()
    }

    /// The catalog document this user was read from (empty for new users)
    pub fn source(&self) -> &Document {
        &self.source
    }

    /// Build from a catalog document; absent fields take their defaults
    pub fn from_document(doc: &Document) -> Self {
        let roles = match doc.get("roles") {
            Some(Bson::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        User {
            id: doc.get_object_id("_id").ok(),
            name: doc.get_str("user").unwrap_or_default().to_string(),
            password_hash: doc.get_str("pwd").unwrap_or_default().to_string(),
            read_only: doc.get_bool("readOnly").unwrap_or(false),
            roles,
            source: doc.clone(),
        }
    }

    /// The source document with the modelled fields written over it
    ///
    /// Fields already present keep their position; new ones are appended.
    pub fn to_document(&self) -> Document {
        let mut doc = self.source.clone();
        if let Some(id) = self.id {
            doc.insert("_id", id);
        }
        doc.insert("user", self.name.clone());
        doc.insert("pwd", self.password_hash.clone());
        doc.insert("readOnly", self.read_only);
        if !self.roles.is_empty() || doc.contains_key("roles") {
            doc.insert("roles", Bson::Array(self.roles.clone()));
        }
        doc
    }
}

/// Two users are equal when they persist to the same document
impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.to_document() == other.to_document()
    }
}

impl From<&Document> for User {
    fn from(doc: &Document) -> Self {
        User::from_document(doc)
    }
}

/// `md5("<user>:mongo:<password>")` as lowercase hex
pub fn password_digest(user: &str, password: &str) -> String {
    format!("{:x}", md5::compute(format!("{}:mongo:{}", user, password)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_password_digest_format() {
        let digest = password_digest("alice", "secret");
        assert_eq!(digest.len(), 32);
        assert_eq!(digest, format!("{:x}", md5::compute("alice:mongo:secret")));
        assert_ne!(digest, password_digest("alice", "other"));
    }

    #[test]
    fn test_document_round_trip() {
        let user = User::with_password("alice", "secret")
            .with_read_only(true)
            .with_roles(["read"]);
        let back = User::from_document(&user.to_document());
        assert_eq!(back, user);
        assert_eq!(back.role_names(), vec!["read"]);
    }

    #[test]
    fn test_from_sparse_document_is_total() {
        let user = User::from(&doc! {"user": "bob"});
        assert_eq!(user.name, "bob");
        assert!(user.id.is_none());
        assert!(!user.read_only);
        assert_eq!(user.source(), &doc! {"user": "bob"});
        assert!(user.to_document().get("_id").is_none());
    }

    #[test]
    fn test_role_documents_are_kept() {
        let user = User::from_document(&doc! {
            "user": "c",
            "roles": [{"role": "readWrite", "db": "shop"}, "dbAdmin"]
        });
        assert_eq!(user.role_names(), vec!["readWrite", "dbAdmin"]);
        assert_eq!(
            user.roles[0],
            Bson::Document(doc! {"role": "readWrite", "db": "shop"})
        );
    }

    #[test]
    fn test_unmodelled_fields_survive_in_place() {
        let id = ObjectId::new();
        let stored = doc! {
            "_id": id,
            "customData": {"team": "ops"},
            "user": "dave",
            "pwd": "old",
            "credentials": {"SCRAM-SHA-1": {"iterationCount": 10000}},
        };
        let mut user = User::from_document(&stored);
        user.read_only = true;
        user.set_password("new");

        let saved = user.to_document();
        assert_eq!(
            saved.keys().collect::<Vec<_>>(),
            vec!["_id", "customData", "user", "pwd", "credentials", "readOnly"]
        );
        assert_eq!(saved.get_document("customData").unwrap(), &doc! {"team": "ops"});
        assert_eq!(saved.get_str("pwd").unwrap(), password_digest("dave", "new"));
        assert!(saved.get("roles").is_none());
    }

    #[test]
    fn test_cleared_roles_are_written_back() {
        let mut user = User::from_document(&doc! {"user": "e", "roles": ["read"]});
        user.roles.clear();
        assert_eq!(user.to_document().get_array("roles").unwrap().len(), 0);
    }
}
