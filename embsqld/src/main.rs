#![deny(rust_2018_idioms)]
//! Runs an embsql server over a freshly seeded in-memory database.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use embsql::{fixture, Engine};
use embsql_server::{Config, Server};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use self::config::DaemonConfig;

/// embsql server daemon
#[derive(Debug, FromArgs)]
struct Args {
    /// path to a toml configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// transport to listen on (`tcp` or `unix`)
    #[argh(option)]
    protocol: Option<String>,

    /// address to bind, a `host:port` pair or a socket path
    #[argh(option, short = 'a')]
    address: Option<String>,

    /// username of the administrative user
    #[argh(option, short = 'u')]
    user: Option<String>,

    /// password of the administrative user
    #[argh(option, short = 'p')]
    password: Option<String>,

    /// number of tables to seed
    #[argh(option)]
    tables: Option<usize>,
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();
    init_logging();

    let config = load_config(args)?;
    let provider =
        fixture::create_test_provider(&config.database, &config.table_prefix, config.tables)
            .context("failed to seed database")?;

    let server = Server::new(
        Config {
            protocol: config.protocol.clone(),
            address: config.address.clone(),
            auth: config.authenticator(),
        },
        Arc::new(Engine::new(provider)),
    )
    .context("failed to start server")?;

    tracing::info!(addr = %server.local_addr(), "accepting connections");
    server.start().context("server stopped unexpectedly")
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("EMBSQL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
        .init();
}

fn load_config(args: Args) -> Result<DaemonConfig> {
    let mut config = match &args.config {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };

    if let Some(protocol) = args.protocol {
        config.protocol = protocol;
    }
    if let Some(address) = args.address {
        config.address = address;
    }
    if let Some(user) = args.user {
        config.user = user;
    }
    if let Some(password) = args.password {
        config.password = password;
    }
    if let Some(tables) = args.tables {
        config.tables = tables;
    }

    Ok(config)
}
