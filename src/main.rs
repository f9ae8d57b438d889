// bootcfg binary: network boot and provisioning config service
use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use std::io::stderr;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

mod cmd;

use cmd::serve::{run_serve, ServeArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Network boot and provisioning config service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level for bootcfg crates (overridden by RUST_LOG)
    #[arg(long, global = true, env = "BOOTCFG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve boot configs over HTTP (default action).
    Serve(ServeArgs),
}

/// Logging directives used when RUST_LOG is unset
fn default_directives(level: &str) -> String {
    format!(
        "bootcfg={level},bootcfg_server={level},bootcfg_ignition={level},bootcfg_metadata={level},tower_http=warn,hyper=warn,minijinja=warn",
        level = level
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { cli.log_level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    registry()
        .with(filter)
        .with(fmt::layer().with_writer(stderr))
        .init();

    let args = match cli.command {
        Some(Commands::Serve(args)) => args,
        None => ServeArgs::from_env(),
    };

    run_serve(args).await.map_err(|e| {
        error!("Server failed: {:#}", e);
        eyre!("server failed: {:#}", e)
    })
}
