//! Dripfeed CLI - launches the local HTTP test server
//!
//! Binds 127.0.0.1:8080 by default and serves until `POST /shutdown`
//! or Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dripfeed_core::ServerConfig;
use dripfeed_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "dripfeed")]
#[command(about = "A local HTTP test-double server with paced downloads")]
struct Cli {
    /// Address to bind
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Directory served under /files
    #[arg(long)]
    files_dir: Option<PathBuf>,

    /// Extra delay-table entries as FILENAME=SECONDS (repeatable)
    #[arg(long = "delay", value_name = "FILE=SECONDS")]
    delays: Vec<String>,

    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None).context("initialize tracing")?;

    let mut config = ServerConfig::from_env();
    if let Some(bind) = cli.bind {
        config.http.bind_address = bind;
    }
    if let Some(dir) = cli.files_dir {
        config.files.root_dir = dir;
    }
    for entry in &cli.delays {
        let (name, seconds) = entry
            .split_once('=')
            .with_context(|| format!("delay entry {entry:?} is not FILE=SECONDS"))?;
        let seconds: f64 = seconds
            .parse()
            .with_context(|| format!("invalid delay seconds in {entry:?}"))?;
        config
            .files
            .delays
            .insert(name.to_string(), Duration::from_secs_f64(seconds));
    }

    dripfeed_web::run_server(config).await.context("server failed")?;
    Ok(())
}
