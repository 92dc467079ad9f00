#![forbid(unsafe_code)]

use clap::Parser;
use muninn_gate_lib::{config::load_from_path, gate, telemetry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(version, about = "Muninn admission gate (per-client sliding-window rate limiting)")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "demos/config/basic.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match load_from_path(&cli.config) {
        Ok(cfg) => {
            if let Err(err) = telemetry::init_tracing(&cfg.logging) {
                eprintln!("failed to initialize logging: {err}");
                std::process::exit(1);
            }
            info!(
                ?cfg.listen,
                max_requests = cfg.rate_limit.max_requests,
                window_secs = cfg.rate_limit.window_secs,
                "configuration loaded"
            );
            let cfg = Arc::new(cfg);
            if let Err(err) = gate::server::run(cfg).await {
                error!(%err, "admission gate exited with error");
                std::process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    }
}
