//! spoty - browse a music catalog and curate custom albums from the terminal

mod commands;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use commands::{App, Command};
use spoty::config;

/// spoty - music catalog client
#[derive(Parser, Debug)]
#[command(name = "spoty")]
#[command(version)]
#[command(about = "Browse a music catalog and curate custom albums")]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Path to config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };

    // keep http internals quiet unless asked for explicitly
    let filter = tracing_subscriber::EnvFilter::new(format!(
        "{},hyper=warn,reqwest=warn,actix_server=warn,actix_web=warn",
        log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let paths = config::Paths::init(args.config)?;
    debug!("Config directory: {:?}", paths.config_dir());

    let app = App::init(paths)?;
    app.run(args.command).await
}
