//! Instrument - HTTP command executor
//!
//! Serves `GET /health` and `POST /run`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};

use instrument::{Config, Overrides};

#[derive(Parser)]
#[command(name = "instrument")]
#[command(about = "HTTP command executor with timeout enforcement and output limits")]
struct Cli {
    /// Config file (default: searched in standard locations)
    #[arg(long, env = "INSTRUMENT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.bind)
    #[arg(long, env = "INSTRUMENT_BIND")]
    bind: Option<SocketAddr>,

    /// Working directory for commands (overrides runner.data_dir)
    #[arg(long, env = "INSTRUMENT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace). Default is info.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    service_common::init_tracing("instrument", cli.verbose)?;

    let config = Config::load(cli.config.as_deref())?.with_overrides(Overrides {
        bind: cli.bind,
        data_dir: cli.data_dir,
    });

    instrument::server::serve(config).await?;
    Ok(())
}
