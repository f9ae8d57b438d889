//! `bootcfg serve`

use bootcfg_server::ServerConfig;
use clap::{Args, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the HTTP server
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BOOTCFG_ADDRESS", default_value = "127.0.0.1:8080")]
    pub address: SocketAddr,

    /// Directory holding groups, profiles and templates
    #[arg(long, env = "BOOTCFG_DATA_PATH", default_value = "/var/lib/bootcfg")]
    pub data_path: PathBuf,

    /// Directory served read-only under /assets
    #[arg(long, env = "BOOTCFG_ASSETS_PATH")]
    pub assets_path: Option<PathBuf>,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_path: PathBuf::from("/var/lib/bootcfg"),
            assets_path: None,
        }
    }
}

#[derive(Parser)]
struct DefaultServe {
    #[command(flatten)]
    args: ServeArgs,
}

impl ServeArgs {
    /// Arguments for a bare `bootcfg` invocation, taken from the
    /// environment and defaults
    pub fn from_env() -> Self {
        DefaultServe::parse_from(["bootcfg"]).args
    }

    pub fn to_config(&self) -> ServerConfig {
        let config = ServerConfig::default()
            .with_address(self.address)
            .with_data_path(&self.data_path);
        match &self.assets_path {
            Some(path) => config.with_assets_path(path),
            None => config,
        }
    }
}

pub async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!(
        address = %args.address,
        data_path = %args.data_path.display(),
        "starting bootcfg"
    );
    bootcfg_server::run(args.to_config()).await
}
