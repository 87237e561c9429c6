use clap::Args;
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::{Command, SqlscribeConfig};

use super::OneShot;

/// Arguments for the Query command
#[derive(Args)]
pub struct QueryArgs {
    /// A single SELECT statement
    #[clap(required = true)]
    pub sql: Vec<String>,
}

pub fn run(config: &SqlscribeConfig, args: QueryArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let sql = args.sql.join(" ");
    OneShot::open(config)?.run(Command::RunQuery { sql }, output_format)
}
