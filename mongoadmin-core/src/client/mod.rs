// mongoadmin-core/src/client/mod.rs
//! Administrative facade
//!
//! [`AdminClient`] owns exactly one connection and exposes intention-level
//! operations on top of it. The operations are split by concern:
//!
//! - `catalog`   - databases and collections
//! - `documents` - query, insert, save, remove
//! - `indexes`   - list, ensure, rename, drop
//! - `system`    - users (`system.users`) and stored functions (`system.js`)
//! - `stats`     - collStats
//!
//! Nothing here retries: every connection failure reaches the caller as is.

mod catalog;
mod documents;
mod indexes;
mod stats;
mod system;

use bson::{Bson, Document};

use crate::connection::Connection;
use crate::error::{AdminError, Result};
use crate::value_utils::{as_i64, as_number};

/// Database that privileged commands such as `renameCollection` run against
pub const ADMIN_DATABASE: &str = "admin";

/// Facade over a single, already authenticated connection
pub struct AdminClient<C: Connection> {
    conn: C,
}

impl<C: Connection> AdminClient<C> {
    pub fn new(conn: C) -> Self {
        AdminClient { conn }
    }

    /// The underlying connection
    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    /// Run a command and turn an `ok: 0` reply into `AdminError::Command`
    pub fn run_command(&self, database: &str, command: &Document) -> Result<Document> {
        tracing::debug!(database, command = %command, "running command");
        let reply = self.conn.run_command(database, command)?;
        check_reply(&reply)?;
        Ok(reply)
    }
}

fn check_reply(reply: &Document) -> Result<()> {
    let ok = match reply.get("ok") {
        Some(Bson::Boolean(b)) => *b,
        Some(other) => as_number(other).map(|n| n != 0.0).unwrap_or(false),
        None => return Ok(()),
    };
    if ok {
        return Ok(());
    }
    let message = reply
        .get_str("errmsg")
        .unwrap_or("command failed without errmsg")
        .to_string();
    Err(match reply.get("code").and_then(as_i64) {
        Some(code) => AdminError::command_with_code(code as i32, message),
        None => AdminError::command(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_check_reply() {
        assert!(check_reply(&doc! {"ok": 1.0}).is_ok());
        assert!(check_reply(&doc! {"ok": true}).is_ok());
        assert!(check_reply(&doc! {"n": 3}).is_ok());

        let err = check_reply(&doc! {"ok": 0.0, "errmsg": "ns not found", "code": 26}).unwrap_err();
        match err {
            AdminError::Command { code, message } => {
                assert_eq!(code, Some(26));
                assert_eq!(message, "ns not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
