//! knetd daemon entry point.
//!
//! Initializes logging, attaches the hardware backend, and serves the KNET
//! gRPC service.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// gRPC agent for OpenNSL KNET interface management.
#[derive(Debug, Parser)]
#[command(name = "knetd", version, about)]
struct Args {
    /// Address to serve the gRPC endpoint on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    listen: SocketAddr,
}

/// Initialize tracing/logging.
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[cfg(feature = "vendor-sdk")]
async fn run(args: Args) -> anyhow::Result<()> {
    info!("attaching OpenNSL KNET backend");
    knetd::serve(args.listen, opennsl_knet::OpennslKnet::new()).await
}

#[cfg(not(feature = "vendor-sdk"))]
async fn run(_args: Args) -> anyhow::Result<()> {
    anyhow::bail!(
        "knetd was built without the vendor-sdk feature; \
         rebuild with --features vendor-sdk to drive hardware"
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    info!("--- Starting knetd, listening on {} ---", args.listen);

    match run(args).await {
        Ok(()) => {
            info!("knetd exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("knetd error: {}", e);
            ExitCode::FAILURE
        }
    }
}
