use clap::Args;
use serde::Serialize;
use sqlscribe::lens::utils::OutputFormat;
use sqlscribe::{Command, Reply, SqlscribeConfig, TranslationEngine};

use super::OneShot;

/// Arguments for the Generate command
#[derive(Args)]
pub struct GenerateArgs {
    /// Plain-English request, e.g. "how many people were born after 1990"
    #[clap(required = true)]
    pub prompt: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Generated<'a> {
    prompt: &'a str,
    sql: &'a str,
}

pub fn run(config: &SqlscribeConfig, args: GenerateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let prompt = args.prompt.join(" ");

    let engine = TranslationEngine::load(config)?;
    let mut console = OneShot::with_engine(config, engine)?;
    let reply = console.dispatch(Command::GenerateSql {
        prompt: prompt.clone(),
    })?;

    match (&reply, output_format.is_json()) {
        (Reply::GeneratedSql { sql }, true) => {
            let generated = Generated { prompt: &prompt, sql };
            let json = match output_format {
                OutputFormat::JsonPretty => serde_json::to_string_pretty(&generated)?,
                _ => serde_json::to_string(&generated)?,
            };
            println!("{}", json);
            Ok(())
        }
        _ => console.print(&reply, output_format),
    }
}
