//! Command dispatch
//!
//! Every user interaction is a [`Command`] handed to [`Console::dispatch`]
//! together with the caller's [`Session`]. The console routes it to the
//! matching lens and returns a [`Reply`] or a recoverable [`ConsoleError`].
//! Successful mutations queue a one-shot notice on the session which the next
//! page render hands back.

mod session;

pub use session::{Notice, Page, Session};

use crate::database::{ColumnInfo, ResultSet, SchemaStore};
use crate::error::{ConsoleError, ConsoleResult};
use crate::lens::admin::{AdminGate, AdminSession, CredentialVerifier, DropOutcome};
use crate::lens::query_gate::QueryGate;
use crate::lens::row_writer::RowWriter;
use crate::lens::table_builder::{ColumnSpec, TableBuilder, TableDefinition};
use crate::lens::translate::TranslationEngine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TABLE_CREATED: &str = "Table created successfully";
pub const ROW_INSERTED: &str = "Row inserted successfully";
pub const TABLE_DROPPED: &str = "Table dropped";

/// A user interaction
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Navigate { page: Page },
    /// Re-render the current page
    Refresh,
    GenerateSql { prompt: String },
    ListTables,
    DescribeTable { table: String },
    ReadTable { table: String },
    CreateTable { table: String, columns: Vec<ColumnSpec> },
    InsertRow { table: String, values: Vec<String> },
    RunQuery { sql: String },
    Login { username: String, password: String },
    DropTable {
        table: String,
        #[serde(default)]
        confirmed: bool,
    },
    Logout,
}

impl Command {
    /// Short name for logs; never includes arguments
    pub fn name(&self) -> &'static str {
        match self {
            Command::Navigate { .. } => "navigate",
            Command::Refresh => "refresh",
            Command::GenerateSql { .. } => "generate_sql",
            Command::ListTables => "list_tables",
            Command::DescribeTable { .. } => "describe_table",
            Command::ReadTable { .. } => "read_table",
            Command::CreateTable { .. } => "create_table",
            Command::InsertRow { .. } => "insert_row",
            Command::RunQuery { .. } => "run_query",
            Command::Login { .. } => "login",
            Command::DropTable { .. } => "drop_table",
            Command::Logout => "logout",
        }
    }
}

/// What a page shows when rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub page: Page,
    /// Current user tables; empty on the generator page
    pub tables: Vec<String>,
    pub admin: AdminSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Successful outcome of a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Page(PageView),
    GeneratedSql { sql: String },
    Tables { tables: Vec<String> },
    Columns { table: String, columns: Vec<ColumnInfo> },
    Rows(ResultSet),
    TableCreated(TableDefinition),
    RowInserted { table: String },
    LoggedIn,
    TableDropped { table: String },
    DropSkipped { table: String },
    LoggedOut,
}

/// Shared handles every session dispatches against
#[derive(Clone)]
pub struct Console {
    store: Arc<SchemaStore>,
    engine: Option<Arc<TranslationEngine>>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl Console {
    pub fn new(
        store: Arc<SchemaStore>,
        engine: Arc<TranslationEngine>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            store,
            engine: Some(engine),
            verifier,
        }
    }

    /// A console for schema and admin work only; `GenerateSql` fails with
    /// [`ConsoleError::FatalLoad`]
    pub fn without_engine(store: Arc<SchemaStore>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            store,
            engine: None,
            verifier,
        }
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// Run one command against `session`
    ///
    /// Errors leave the session usable; a failed login also leaves it logged
    /// out.
    pub fn dispatch(&self, session: &mut Session, command: Command) -> ConsoleResult<Reply> {
        tracing::debug!("dispatch {}", command.name());
        match command {
            Command::Navigate { page } => {
                session.page = page;
                self.render(session).map(Reply::Page)
            }
            Command::Refresh => self.render(session).map(Reply::Page),
            Command::GenerateSql { prompt } => {
                if prompt.trim().is_empty() {
                    return Err(ConsoleError::validation("prompt", "Enter a prompt first"));
                }
                let engine = self.engine.as_ref().ok_or_else(|| {
                    ConsoleError::FatalLoad("no translation model is loaded".to_string())
                })?;
                let sql = engine.generate(&prompt)?;
                Ok(Reply::GeneratedSql { sql })
            }
            Command::ListTables => Ok(Reply::Tables {
                tables: self.store.list_tables()?,
            }),
            Command::DescribeTable { table } => {
                let columns = self.describe_existing(&table)?;
                Ok(Reply::Columns { table, columns })
            }
            Command::ReadTable { table } => Ok(Reply::Rows(self.store.read_all(&table)?)),
            Command::CreateTable { table, columns } => {
                let definition = TableBuilder::new(&self.store).create_table(&table, &columns)?;
                session.flash(Notice::success(TABLE_CREATED));
                Ok(Reply::TableCreated(definition))
            }
            Command::InsertRow { table, values } => {
                RowWriter::new(&self.store).insert_row(&table, &values)?;
                session.flash(Notice::success(ROW_INSERTED));
                Ok(Reply::RowInserted { table })
            }
            Command::RunQuery { sql } => {
                Ok(Reply::Rows(QueryGate::new(&self.store).run_select(&sql)?))
            }
            Command::Login { username, password } => {
                self.admin_gate()
                    .login(&mut session.admin, &username, &password)?;
                Ok(Reply::LoggedIn)
            }
            Command::DropTable { table, confirmed } => {
                match self.admin_gate().drop_table(&session.admin, &table, confirmed)? {
                    DropOutcome::Dropped(table) => {
                        session.flash(Notice::success(TABLE_DROPPED));
                        Ok(Reply::TableDropped { table })
                    }
                    DropOutcome::Skipped => Ok(Reply::DropSkipped { table }),
                }
            }
            Command::Logout => {
                self.admin_gate().logout(&mut session.admin);
                Ok(Reply::LoggedOut)
            }
        }
    }

    /// Render the session's current page, consuming any pending notice
    pub fn render(&self, session: &mut Session) -> ConsoleResult<PageView> {
        let tables = match session.page {
            Page::SqlGenerator => Vec::new(),
            Page::DbConsole | Page::AdminPanel => self.store.list_tables()?,
        };
        Ok(PageView {
            page: session.page,
            tables,
            admin: session.admin,
            notice: session.take_flash(),
        })
    }

    fn describe_existing(&self, table: &str) -> ConsoleResult<Vec<ColumnInfo>> {
        if !self.store.table_exists(table)? {
            return Err(ConsoleError::SqlExecution(format!("no such table: {}", table)));
        }
        self.store.describe(table)
    }

    fn admin_gate(&self) -> AdminGate<'_> {
        AdminGate::new(&self.store, self.verifier.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;
    use crate::lens::admin::BcryptCredential;
    use crate::lens::translate::{GenerationOptions, Seq2SeqModel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingModel(Arc<AtomicUsize>);

    impl Seq2SeqModel for CountingModel {
        fn generate(&mut self, prompt: &str, _: &GenerationOptions) -> ConsoleResult<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(format!("SELECT '{}'</s>", prompt.len()))
        }
    }

    fn console() -> (Console, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = TranslationEngine::new(
            Box::new(CountingModel(calls.clone())),
            64,
            Duration::from_secs(5),
        );
        let verifier =
            BcryptCredential::new("admin", Some(bcrypt::hash("admin123", 4).unwrap()));
        let console = Console::new(
            Arc::new(SchemaStore::open_in_memory().unwrap()),
            Arc::new(engine),
            Arc::new(verifier),
        );
        (console, calls)
    }

    fn create(console: &Console, session: &mut Session, table: &str, cols: &[(&str, &str)]) {
        let columns = cols.iter().map(|(n, t)| ColumnSpec::new(*n, *t)).collect();
        console
            .dispatch(
                session,
                Command::CreateTable {
                    table: table.into(),
                    columns,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_empty_prompt_never_reaches_engine() {
        let (console, calls) = console();
        let mut session = Session::new();
        let err = console
            .dispatch(&mut session, Command::GenerateSql { prompt: "  \n".into() })
            .unwrap_err();
        assert_eq!(err, ConsoleError::validation("prompt", "Enter a prompt first"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let reply = console
            .dispatch(&mut session, Command::GenerateSql { prompt: "abc".into() })
            .unwrap();
        assert_eq!(reply, Reply::GeneratedSql { sql: "SELECT '3'".into() });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_console_without_engine() {
        let console = Console::without_engine(
            Arc::new(SchemaStore::open_in_memory().unwrap()),
            Arc::new(BcryptCredential::new("admin", None)),
        );
        let mut session = Session::new();

        let err = console
            .dispatch(&mut session, Command::GenerateSql { prompt: " ".into() })
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { .. }));

        let err = console
            .dispatch(&mut session, Command::GenerateSql { prompt: "list".into() })
            .unwrap_err();
        assert!(matches!(err, ConsoleError::FatalLoad(_)));

        create(&console, &mut session, "t", &[("a", "TEXT")]);
        assert_eq!(
            console.dispatch(&mut session, Command::ListTables).unwrap(),
            Reply::Tables {
                tables: vec!["t".to_string()]
            }
        );
    }

    #[test]
    fn test_flash_after_create_shows_once() {
        let (console, _) = console();
        let mut session = Session::new();
        create(&console, &mut session, "t", &[("a", "INTEGER")]);

        let Reply::Page(view) = console
            .dispatch(&mut session, Command::Navigate { page: Page::DbConsole })
            .unwrap()
        else {
            panic!("expected page");
        };
        assert_eq!(view.tables, vec!["t".to_string()]);
        assert_eq!(view.notice, Some(Notice::success(TABLE_CREATED)));

        let reply = console.dispatch(&mut session, Command::Refresh).unwrap();
        let Reply::Page(view) = reply else {
            panic!("expected page");
        };
        assert_eq!(view.page, Page::DbConsole);
        assert_eq!(view.notice, None);
    }

    #[test]
    fn test_end_to_end_integer_affinity() {
        let (console, _) = console();
        let mut session = Session::new();
        create(&console, &mut session, "t", &[("a", "INTEGER")]);
        console
            .dispatch(
                &mut session,
                Command::InsertRow {
                    table: "t".into(),
                    values: vec!["5".into()],
                },
            )
            .unwrap();
        assert_eq!(
            session.take_flash(),
            Some(Notice::success(ROW_INSERTED))
        );

        let reply = console
            .dispatch(&mut session, Command::ReadTable { table: "t".into() })
            .unwrap();
        let Reply::Rows(rows) = reply else {
            panic!("expected rows");
        };
        assert_eq!(rows.rows, vec![vec![CellValue::Integer(5)]]);
    }

    #[test]
    fn test_admin_flow() {
        let (console, _) = console();
        let mut session = Session::new();
        create(&console, &mut session, "t", &[("a", "TEXT")]);
        let drop_cmd = |confirmed| Command::DropTable {
            table: "t".into(),
            confirmed,
        };

        let err = console.dispatch(&mut session, drop_cmd(true)).unwrap_err();
        assert!(matches!(err, ConsoleError::Auth(_)));

        let err = console
            .dispatch(
                &mut session,
                Command::Login {
                    username: "admin".into(),
                    password: "wrong".into(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Auth(_)));
        assert_eq!(session.admin, AdminSession::LoggedOut);

        console
            .dispatch(
                &mut session,
                Command::Login {
                    username: "admin".into(),
                    password: "admin123".into(),
                },
            )
            .unwrap();
        assert_eq!(session.admin, AdminSession::LoggedIn);

        let reply = console.dispatch(&mut session, drop_cmd(false)).unwrap();
        assert_eq!(reply, Reply::DropSkipped { table: "t".into() });
        assert!(console.store().table_exists("t").unwrap());

        let reply = console.dispatch(&mut session, drop_cmd(true)).unwrap();
        assert_eq!(reply, Reply::TableDropped { table: "t".into() });
        assert!(!console.store().table_exists("t").unwrap());

        console.dispatch(&mut session, Command::Logout).unwrap();
        assert_eq!(session.admin, AdminSession::LoggedOut);
    }

    #[test]
    fn test_query_policy_through_dispatch() {
        let (console, _) = console();
        let mut session = Session::new();
        create(&console, &mut session, "x", &[("a", "INTEGER")]);
        let err = console
            .dispatch(&mut session, Command::RunQuery { sql: "DROP TABLE x".into() })
            .unwrap_err();
        assert!(matches!(err, ConsoleError::PolicyViolation(_)));
        assert!(console.store().table_exists("x").unwrap());
    }

    #[test]
    fn test_describe_unknown_table() {
        let (console, _) = console();
        let mut session = Session::new();
        let err = console
            .dispatch(&mut session, Command::DescribeTable { table: "nope".into() })
            .unwrap_err();
        assert!(matches!(err, ConsoleError::SqlExecution(_)));
    }

    #[test]
    fn test_sessions_are_independent() {
        let (console, _) = console();
        let mut a = Session::new();
        let mut b = Session::new();
        console
            .dispatch(
                &mut a,
                Command::Login {
                    username: "admin".into(),
                    password: "admin123".into(),
                },
            )
            .unwrap();
        create(&console, &mut a, "t", &[("a", "TEXT")]);

        assert_eq!(b.admin, AdminSession::LoggedOut);
        assert!(console.render(&mut b).unwrap().notice.is_none());
        assert!(console
            .dispatch(
                &mut b,
                Command::DropTable {
                    table: "t".into(),
                    confirmed: true
                }
            )
            .is_err());
    }

    #[test]
    fn test_command_json_shape() {
        let cmd: Command = serde_json::from_str(
            r#"{"command":"create_table","table":"t","columns":[{"name":"a","type":"INTEGER"}]}"#,
        )
        .unwrap();
        assert_eq!(cmd.name(), "create_table");

        let cmd: Command =
            serde_json::from_str(r#"{"command":"drop_table","table":"t"}"#).unwrap();
        assert!(matches!(cmd, Command::DropTable { confirmed: false, .. }));
    }
}
