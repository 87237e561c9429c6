use clap::Args;
use sqlscribe::lens::admin::BcryptCredential;
use sqlscribe::server::{create_router, start_server, ServerConfig};
use sqlscribe::{Console, SqlscribeConfig, TranslationEngine};
use std::sync::Arc;

use super::open_store;

/// Arguments for the Serve command
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind, overrides `server_address`
    #[clap(long)]
    pub address: Option<String>,

    /// Port to bind, overrides `server_port`
    #[clap(short, long)]
    pub port: Option<u16>,
}

pub fn run(config: &SqlscribeConfig, args: ServeArgs) -> anyhow::Result<()> {
    let mut server_config = ServerConfig::from_config(config);
    if let Some(address) = args.address {
        server_config = server_config.with_address(address);
    }
    if let Some(port) = args.port {
        server_config = server_config.with_port(port);
    }

    // model first: a missing checkpoint should stop us before anything binds
    let engine = TranslationEngine::load(config)?;
    let store = Arc::new(open_store(config)?);
    let console = Console::new(store, engine, Arc::new(BcryptCredential::from_config(config)));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(start_server(create_router(), console, server_config))
}
