use clap::Args;
use serde::Serialize;
use sqlscribe::lens::admin::{hash_password, BCRYPT_COST};
use sqlscribe::lens::utils::OutputFormat;

/// Arguments for the HashPassword command
#[derive(Args)]
pub struct HashPasswordArgs {
    /// Password to hash; read from stdin when not given
    #[clap(env = "SQLSCRIBE_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// bcrypt cost factor
    #[clap(long, default_value_t = BCRYPT_COST)]
    pub cost: u32,
}

#[derive(Debug, Serialize)]
struct HashedPassword {
    admin_password_hash: String,
}

pub fn run(args: HashPasswordArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let password = match args.password {
        Some(p) => p,
        None => {
            eprint!("Password to hash: ");
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            input.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    let hash = hash_password(&password, args.cost)?;

    if output_format.is_json() {
        println!(
            "{}",
            serde_json::to_string(&HashedPassword {
                admin_password_hash: hash
            })?
        );
    } else {
        eprintln!("Add this line to your sqlscribe.toml:");
        println!("admin_password_hash = \"{}\"", hash);
    }
    Ok(())
}
