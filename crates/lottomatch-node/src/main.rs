//! `lottomatch-node`: runs the round sweep and bill reconciliation until
//! interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lottomatch_node::{Node, NodeError, init_tracing, load_config};
use lottomatch_types::{SystemClock, constants};

#[derive(Parser, Debug)]
#[command(author, version, about = "LottoMatch round scheduler and wager admission node")]
struct Args {
    /// JSON config file. Defaults apply when omitted.
    #[arg(long, env = "LOTTOMATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON log lines regardless of the config file.
    #[arg(long, env = "LOTTOMATCH_LOG_JSON", default_value_t = false)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "node terminated with error");
        eprintln!("lottomatch-node: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), NodeError> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if args.log_json {
        config.log.json = true;
    }
    init_tracing(&config.log)?;

    tracing::info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        config = ?args.config,
        products = config.products.len(),
        utc_offset_minutes = config.timezone.utc_offset_minutes,
        "starting node"
    );

    let node = Node::build(config, Arc::new(SystemClock))?;
    let supervisor = node.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    supervisor.shutdown().await;
    tracing::info!("node stopped");
    Ok(())
}
