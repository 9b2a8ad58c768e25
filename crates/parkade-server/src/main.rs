use clap::Parser;
use parkade_core::{Engine, EngineOptions};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "parkade-server", version, about = "Parkade HTTP JSON API server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8321)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Directory holding the facility store.
    #[arg(long, default_value = "./parkade-data")]
    data_dir: PathBuf,

    /// Store backend: "file" (durable, under --data-dir) or "memory".
    #[arg(long, default_value = "file")]
    store_backend: String,

    /// Number of request worker threads.
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Reject unrecognized vehicle types instead of treating them as cars.
    #[arg(long)]
    strict_vehicle_types: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = fs::create_dir_all(&cli.data_dir) {
        error!("failed to create data directory {}: {e}", cli.data_dir.display());
        return ExitCode::FAILURE;
    }

    let options = EngineOptions {
        strict_vehicle_types: cli.strict_vehicle_types,
    };
    let store = match parkade_store::select_store(&cli.store_backend, &cli.data_dir) {
        Ok(store) => store,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!("using {} store backend", store.name());
    let engine = Arc::new(Engine::new(store, options));
    if !engine.is_available() {
        warn!("facility store is unavailable; requests will retry the load");
    }

    let addr = format!("{}:{}", cli.bind, cli.port);
    let server = match parkade_server::bind(&addr) {
        Ok(server) => server,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("starting parkade-server on {addr}");
    info!("data directory: {}", cli.data_dir.display());

    let workers = cli.workers.max(1);
    let stopper = Arc::clone(&server);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("shutting down");
        parkade_server::shutdown(&stopper, workers);
    }) {
        warn!("failed to install signal handler: {e}");
    }

    parkade_server::serve(&server, &engine, workers);
    ExitCode::SUCCESS
}
