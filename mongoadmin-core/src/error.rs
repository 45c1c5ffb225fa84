// mongoadmin-core/src/error.rs
//! Error types shared by the facade, the connection boundary and the
//! in-memory server.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    /// Malformed namespace, missing `_id`, malformed system document
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed index-specification text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Only raised where the connection reports absence explicitly
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport failure reported by the connection
    #[error("Connection failure: {0}")]
    Connection(String),

    /// The server rejected a command or write
    #[error("Command failed{}: {message}", code_suffix(.code))]
    Command { code: Option<i32>, message: String },

    /// A listing skipped entries it could not parse
    #[error("Partial result: {loaded} loaded, {skipped} skipped")]
    PartialResult { loaded: usize, skipped: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BSON decode error: {0}")]
    BsonDecode(#[from] bson::de::Error),

    #[error("BSON encode error: {0}")]
    BsonEncode(#[from] bson::ser::Error),
}

impl AdminError {
    /// Shorthand for a server-side failure without an error code
    pub fn command(message: impl Into<String>) -> Self {
        AdminError::Command {
            code: None,
            message: message.into(),
        }
    }

    /// Shorthand for a server-side failure carrying the server's error code
    pub fn command_with_code(code: i32, message: impl Into<String>) -> Self {
        AdminError::Command {
            code: Some(code),
            message: message.into(),
        }
    }

    /// True for failures the caller should report as "fix your input"
    /// rather than as a transient operation failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AdminError::InvalidArgument(_) | AdminError::Parse(_)
        )
    }
}

fn code_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (code {})", c)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display_with_code() {
        let err = AdminError::command_with_code(11000, "E11000 duplicate key error");
        assert_eq!(
            err.to_string(),
            "Command failed (code 11000): E11000 duplicate key error"
        );
    }

    #[test]
    fn test_command_display_without_code() {
        let err = AdminError::command("no such cmd");
        assert_eq!(err.to_string(), "Command failed: no such cmd");
    }

    #[test]
    fn test_user_error_classification() {
        assert!(AdminError::InvalidArgument("x".into()).is_user_error());
        assert!(AdminError::Parse("x".into()).is_user_error());
        assert!(!AdminError::Connection("x".into()).is_user_error());
        assert!(!AdminError::command("x").is_user_error());
    }
}
