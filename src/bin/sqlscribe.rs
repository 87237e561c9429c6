mod commands;

use clap::{Parser, Subcommand};
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::{ConsoleError, Notice, SqlscribeConfig};
use tracing::{warn, Level};

use commands::admin::DropArgs;
use commands::config::ConfigArgs;
use commands::generate::GenerateArgs;
use commands::hash_password::HashPasswordArgs;
use commands::query::QueryArgs;
use commands::schema::{CreateArgs, DescribeArgs, InsertArgs, ShowArgs};
use commands::serve::ServeArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.sqlscribe/sqlscribe.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a plain-English request into SQL
    Generate(GenerateArgs),

    /// List user tables
    Tables,

    /// Show the columns of a table
    Describe(DescribeArgs),

    /// Print every row of a table
    Show(ShowArgs),

    /// Create a table from NAME:TYPE column definitions
    Create(CreateArgs),

    /// Insert one row into a table
    Insert(InsertArgs),

    /// Run a single read-only SELECT statement
    Query(QueryArgs),

    /// Drop a table (administrator only)
    Drop(DropArgs),

    /// Start the WebSocket server
    Serve(ServeArgs),

    /// Show configuration and model/database status
    Config(ConfigArgs),

    /// Print a bcrypt hash for `admin_password_hash`
    HashPassword(HashPasswordArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug {
        Level::DEBUG
    } else if matches!(cli.command, Commands::Serve(_)) {
        Level::INFO
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match SqlscribeConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if !config.admin_enabled() {
        warn!("admin_password_hash is not set; administrator login is disabled");
    }

    let format = cli.format;
    let result = match cli.command {
        Commands::Generate(args) => commands::generate::run(&config, args, format),
        Commands::Tables => commands::schema::run_tables(&config, format),
        Commands::Describe(args) => commands::schema::run_describe(&config, args, format),
        Commands::Show(args) => commands::schema::run_show(&config, args, format),
        Commands::Create(args) => commands::schema::run_create(&config, args, format),
        Commands::Insert(args) => commands::schema::run_insert(&config, args, format),
        Commands::Query(args) => commands::query::run(&config, args, format),
        Commands::Drop(args) => commands::admin::run(&config, args, format),
        Commands::Serve(args) => commands::serve::run(&config, args),
        Commands::Config(args) => {
            commands::config::run(&config, args, format);
            Ok(())
        }
        Commands::HashPassword(args) => commands::hash_password::run(args, format),
    };

    if let Err(e) = result {
        match e.downcast_ref::<ConsoleError>() {
            Some(err) => commands::print_notice(&Notice::from(err), format),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}
