// mongoadmin-core/src/lib.rs
// Administration facade for a MongoDB-style document server

pub mod client;
pub mod connection;
pub mod document;
pub mod error;
pub mod function;
pub mod index;
pub mod listing;
pub mod memory;
pub mod namespace;
pub mod query;
pub mod stats;
pub mod user;
pub mod value_utils;

/// Per-database index catalog collection
pub const SYSTEM_INDEXES: &str = "system.indexes";

/// Per-database user collection
pub const SYSTEM_USERS: &str = "system.users";

/// Per-database stored JavaScript functions
pub const SYSTEM_JS: &str = "system.js";

// Public exports
pub use client::{AdminClient, ADMIN_DATABASE};
pub use connection::{Connection, DocumentCursor};
pub use error::{AdminError, Result};
pub use function::{Function, FunctionListing};
pub use index::{IndexListing, IndexSpec};
pub use listing::{PartialListing, SkippedEntry};
pub use memory::{JournalEntry, MemoryConnection, Primitive};
pub use namespace::Namespace;
pub use query::{CursorOptions, QueryRequest, QuerySpec};
pub use stats::CollectionInfo;
pub use user::User;
