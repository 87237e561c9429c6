//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper (writer and query-only readers)
//! - `DatabaseLocation`: file or shared in-memory database
//! - identifier sanitization for names embedded in statement text

mod connection;
mod identifier;

pub use connection::{DatabaseConn, DatabaseLocation};
pub use identifier::{quote_identifier, sanitize_identifier};
