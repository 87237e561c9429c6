use clap::Args;
use sqlscribe::lens::table_builder::ColumnSpec;
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::{Command, SqlscribeConfig};

use super::OneShot;

/// Arguments for the Describe command
#[derive(Args)]
pub struct DescribeArgs {
    /// Table to describe
    pub table: String,
}

/// Arguments for the Show command
#[derive(Args)]
pub struct ShowArgs {
    /// Table to print in full
    pub table: String,
}

/// Arguments for the Create command
#[derive(Args)]
pub struct CreateArgs {
    /// Name of the new table
    pub table: String,

    /// Column definitions as NAME:TYPE, e.g. `born:DATE` (TYPE is one of
    /// INTEGER, TEXT, REAL, DATE)
    #[clap(required = true, value_name = "NAME:TYPE")]
    pub columns: Vec<ColumnSpec>,
}

/// Arguments for the Insert command
#[derive(Args)]
pub struct InsertArgs {
    /// Target table
    pub table: String,

    /// One value per column, in column order; DATE columns take YYYY-MM-DD
    #[clap(required = true, allow_hyphen_values = true)]
    pub values: Vec<String>,
}

pub fn run_tables(config: &SqlscribeConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    OneShot::open(config)?.run(Command::ListTables, output_format)
}

pub fn run_describe(
    config: &SqlscribeConfig,
    args: DescribeArgs,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let command = Command::DescribeTable { table: args.table };
    OneShot::open(config)?.run(command, output_format)
}

pub fn run_show(config: &SqlscribeConfig, args: ShowArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let command = Command::ReadTable { table: args.table };
    OneShot::open(config)?.run(command, output_format)
}

pub fn run_create(config: &SqlscribeConfig, args: CreateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let command = Command::CreateTable {
        table: args.table,
        columns: args.columns,
    };
    OneShot::open(config)?.run(command, output_format)
}

pub fn run_insert(config: &SqlscribeConfig, args: InsertArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let command = Command::InsertRow {
        table: args.table,
        values: args.values,
    };
    OneShot::open(config)?.run(command, output_format)
}
