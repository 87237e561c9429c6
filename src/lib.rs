#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! sqlscribe - natural language to SQL, plus a console for ad-hoc SQLite tables
//!
//! sqlscribe translates English requests into SQL with a pre-trained T5
//! checkpoint and lets users create tables, insert rows, run read-only queries
//! and, as an administrator, drop tables. It can be used as a command-line
//! application, a WebSocket service, or a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | database, lenses, console dispatch | `rusqlite`, `bcrypt`, `chrono` |
//! | `t5` | T5 translation backend | `candle-*`, `tokenizers` |
//! | `cuda` / `metal` | GPU backends for `t5` | `candle-*` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | CLI binary with WebSocket server | all above + `clap`, `axum` |
//!
//! ```toml
//! # Console and database only, bring your own model backend
//! sqlscribe = { version = "0.1", default-features = false }
//!
//! # Default (CLI binary)
//! sqlscribe = "0.1"
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: `SchemaStore`, the only component touching SQLite
//! - **[`lens`]**: business logic (`TableBuilder`, `RowWriter`, `QueryGate`,
//!   `AdminGate`, `TranslationEngine`) and output formatting
//! - **[`console`]**: `Command` dispatch over a per-user `Session`
//! - **[`server`]**: WebSocket API (requires `cli`)
//! - **[`config`]**, **[`error`]**: configuration and the error taxonomy
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sqlscribe::console::{Command, Console, Session};
//! use sqlscribe::lens::admin::BcryptCredential;
//! use sqlscribe::lens::table_builder::ColumnSpec;
//! use sqlscribe::{SchemaStore, SqlscribeConfig, TranslationEngine};
//! use std::sync::Arc;
//!
//! let config = SqlscribeConfig::new(&None)?;
//! let console = Console::new(
//!     Arc::new(SchemaStore::from_config(&config)?),
//!     TranslationEngine::load(&config)?,
//!     Arc::new(BcryptCredential::from_config(&config)),
//! );
//!
//! let mut session = Session::new();
//! console.dispatch(&mut session, Command::CreateTable {
//!     table: "people".into(),
//!     columns: vec![ColumnSpec::new("name", "TEXT"), ColumnSpec::new("born", "DATE")],
//! })?;
//! ```

pub mod config;
pub mod console;
pub mod database;
pub mod error;
pub mod lens;

// Server module - requires CLI feature
#[cfg(feature = "cli")]
pub mod server;

pub use config::SqlscribeConfig;
pub use error::{ConsoleError, ConsoleResult, NoticeLevel};

pub use database::{CellValue, ColumnInfo, DatabaseLocation, ResultSet, SchemaStore, StoreOptions};

pub use console::{Command, Console, Notice, Page, PageView, Reply, Session};

pub use lens::translate::{Seq2SeqModel, TranslationEngine};
pub use lens::utils::OutputFormat;

#[cfg(feature = "cli")]
pub use server::{
    create_router, start_server, Dispatcher, Router, ServerConfig, ServerState, WsContext,
    WsError, WsMethod, WsRequest, WsResult, WsSink,
};
