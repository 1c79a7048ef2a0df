// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use vidadmin::api::ClientOptions;
use vidadmin::config::SERVER_ENV_VAR;
use vidadmin::{AdminClient, Config, SessionStore};

mod cli;
use cli::{
    AccessCommand, AuthCommand, BannerCommand, CommandContext, EpisodeCommand, OutputFormat,
    SeriesCommand, UserCommand,
};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "vidadmin")]
#[command(about = "Admin console for the video streaming backend")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (vidadmin_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Backend base URL (or set VIDADMIN_SERVER)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Auth(AuthCommand),

    /// Manage series
    #[command(subcommand)]
    Series(SeriesCommand),

    /// Manage episodes
    #[command(subcommand)]
    Episodes(EpisodeCommand),

    /// Manage banners
    #[command(subcommand)]
    Banners(BannerCommand),

    /// Manage users
    #[command(subcommand)]
    Users(UserCommand),

    /// Manage per-user series access
    #[command(subcommand)]
    Access(AccessCommand),
}

fn init_logging(cli: &Cli) -> Result<()> {
    if cli.debug_log {
        let file = File::create("vidadmin_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("vidadmin=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if cli.config.is_some() {
        Config::load(&config_path)?
    } else {
        Config::load_or_default(&config_path)
    };

    let env_server = std::env::var(SERVER_ENV_VAR).ok();
    let base_url = config.resolve_base_url(cli.server.as_deref(), env_server.as_deref());
    tracing::debug!("Using server {}", base_url);

    let format = OutputFormat::from_str(cli.format.as_deref().unwrap_or(&config.output.format))?;

    let session = SessionStore::for_server(&base_url)?;
    let client = AdminClient::new(&base_url, ClientOptions::from(&config.server), session)?;
    let context = CommandContext::new(client, format);

    match cli.command {
        Commands::Auth(cmd) => cmd.execute(context).await?,
        Commands::Series(cmd) => cmd.execute(context).await?,
        Commands::Episodes(cmd) => cmd.execute(context).await?,
        Commands::Banners(cmd) => cmd.execute(context).await?,
        Commands::Users(cmd) => cmd.execute(context).await?,
        Commands::Access(cmd) => cmd.execute(context).await?,
    }

    Ok(())
}
