pub mod admin;
pub mod config;
pub mod generate;
pub mod hash_password;
pub mod query;
pub mod schema;
pub mod serve;

use sqlscribe::lens::admin::BcryptCredential;
use sqlscribe::lens::utils::{render_columns, render_names, render_result_set, OutputFormat};
use sqlscribe::{
    Command, Console, Notice, NoticeLevel, Reply, SchemaStore, Session, SqlscribeConfig,
    TranslationEngine,
};
use std::sync::Arc;

pub(crate) fn open_store(config: &SqlscribeConfig) -> anyhow::Result<SchemaStore> {
    SchemaStore::from_config(config)
}

/// A console plus the single session one CLI invocation runs in
pub(crate) struct OneShot {
    console: Console,
    session: Session,
}

impl OneShot {
    /// Console without a translation model, for schema and admin commands
    pub(crate) fn open(config: &SqlscribeConfig) -> anyhow::Result<Self> {
        let console = Console::without_engine(
            Arc::new(open_store(config)?),
            Arc::new(BcryptCredential::from_config(config)),
        );
        Ok(Self::with_console(console))
    }

    pub(crate) fn with_engine(
        config: &SqlscribeConfig,
        engine: Arc<TranslationEngine>,
    ) -> anyhow::Result<Self> {
        let console = Console::new(
            Arc::new(open_store(config)?),
            engine,
            Arc::new(BcryptCredential::from_config(config)),
        );
        Ok(Self::with_console(console))
    }

    fn with_console(console: Console) -> Self {
        Self {
            console,
            session: Session::new(),
        }
    }

    pub(crate) fn dispatch(&mut self, command: Command) -> anyhow::Result<Reply> {
        Ok(self.console.dispatch(&mut self.session, command)?)
    }

    /// Dispatch `command` and print its reply along with any pending notice
    pub(crate) fn run(&mut self, command: Command, output_format: OutputFormat) -> anyhow::Result<()> {
        let reply = self.dispatch(command)?;
        self.print(&reply, output_format)
    }

    pub(crate) fn print(&mut self, reply: &Reply, output_format: OutputFormat) -> anyhow::Result<()> {
        // a JSON create prints the definition alone
        let quiet = output_format.is_json() && matches!(reply, Reply::TableCreated(_));
        if let Some(notice) = self.session.take_flash().filter(|_| !quiet) {
            print_notice(&notice, output_format);
        }

        match reply {
            Reply::GeneratedSql { sql } => println!("{}", sql),
            Reply::Tables { tables } => {
                if tables.is_empty() && !output_format.is_json() {
                    eprintln!("No tables yet. Create one with `sqlscribe create`.");
                } else {
                    println!("{}", render_names("table", tables, output_format));
                }
            }
            Reply::Columns { columns, .. } => println!("{}", render_columns(columns, output_format)),
            Reply::Rows(rows) => println!("{}", render_result_set(rows, output_format)),
            Reply::TableCreated(definition) => {
                if output_format.is_json() {
                    println!("{}", serde_json::to_string(definition)?);
                } else {
                    println!("{}", definition.to_sql());
                }
            }
            Reply::DropSkipped { table } => print_notice(
                &Notice::info(format!("Table '{}' was not dropped", table)),
                output_format,
            ),
            Reply::Page(_)
            | Reply::RowInserted { .. }
            | Reply::TableDropped { .. }
            | Reply::LoggedIn
            | Reply::LoggedOut => {}
        }
        Ok(())
    }
}

/// Print a one-line notice, as JSON when a JSON format was requested
pub(crate) fn print_notice(notice: &Notice, output_format: OutputFormat) {
    if output_format.is_json() {
        match serde_json::to_string(notice) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error serializing notice: {}", e),
        }
        return;
    }

    let tag = match notice.level {
        NoticeLevel::Success => "success",
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    match notice.level {
        NoticeLevel::Success | NoticeLevel::Info => println!("[{}] {}", tag, notice.text),
        NoticeLevel::Warning | NoticeLevel::Error => eprintln!("[{}] {}", tag, notice.text),
    }
}

/// Ask a yes/no question on stderr; anything but y/yes is a no
pub(crate) fn confirm(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}
