use clap::Args;
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::{Command, SqlscribeConfig};

use super::{confirm, OneShot};

/// Arguments for the Drop command
#[derive(Args)]
pub struct DropArgs {
    /// Table to drop
    pub table: String,

    /// Administrator user name, defaults to `admin_user` from the config
    #[clap(short, long)]
    pub user: Option<String>,

    /// Administrator password; read from stdin when not given
    #[clap(short, long, env = "SQLSCRIBE_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip confirmation prompt
    #[clap(long, short = 'y')]
    pub yes: bool,
}

pub fn run(config: &SqlscribeConfig, args: DropArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let DropArgs {
        table,
        user,
        password,
        yes,
    } = args;

    let mut console = OneShot::open(config)?;
    let username = user.unwrap_or_else(|| config.admin_user.clone());
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };
    console.dispatch(Command::Login { username, password })?;

    let confirmed = yes || (!output_format.is_json() && confirm(&format!("Drop table '{}'?", table)));
    let dropped = console.dispatch(Command::DropTable { table, confirmed });
    console.dispatch(Command::Logout)?;

    console.print(&dropped?, output_format)
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
