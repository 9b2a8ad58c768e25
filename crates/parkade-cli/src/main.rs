mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_LAYOUT_ERROR, EXIT_STORE_ERROR};
use parkade_core::{Engine, EngineOptions};
use parkade_schema::SizeClass;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "parkade",
    version,
    about = "Multi-level parking slot allocation"
)]
struct Cli {
    /// Path to the Parkade data directory.
    #[arg(long, default_value = "~/.local/share/parkade", global = true)]
    store: String,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Reject unrecognized vehicle types instead of parking them as cars.
    #[arg(long, default_value_t = false, global = true)]
    strict_vehicle_types: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create levels and slots in an empty store from a TOML layout.
    Init {
        /// Path to the facility layout file.
        layout: PathBuf,
    },
    /// Park a vehicle in the first slot that fits it.
    Park {
        /// License plate.
        plate: String,
        /// Vehicle type: Motorcycle, Car, or Bus.
        #[arg(long, default_value = "Car")]
        kind: String,
    },
    /// Release a parked vehicle.
    Leave {
        /// License plate.
        plate: String,
    },
    /// List all parked vehicles.
    List,
    /// Show free and total slot counts.
    Status,
    /// Show every level with its slots and occupants.
    Levels,
    /// Add or remove levels.
    Level {
        #[command(subcommand)]
        action: LevelAction,
    },
    /// Add or remove slots.
    Slot {
        #[command(subcommand)]
        action: SlotAction,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum LevelAction {
    /// Add an empty level after the highest existing one.
    Add,
    /// Remove the highest-numbered level (must have no parked vehicles).
    Remove {
        /// Level number.
        level: u32,
    },
}

#[derive(Debug, Subcommand)]
enum SlotAction {
    /// Append a slot to a level.
    Add {
        /// Level number.
        level: u32,
        /// Slot size: motorcycle, car, bus, or 0-2.
        size: SizeClass,
    },
    /// Remove the highest-numbered slot of a level (must be empty).
    Remove {
        /// Level number.
        level: u32,
        /// Slot number.
        slot: u32,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PARKADE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let store_path = expand_tilde(&cli.store);
    let options = EngineOptions {
        strict_vehicle_types: cli.strict_vehicle_types,
    };
    let open = || Engine::with_file_store(&store_path, options);

    let result = match cli.command {
        Commands::Init { layout } => commands::init::run(&open(), &layout, json),
        Commands::Park { plate, kind } => commands::park::run(&open(), &plate, &kind, json),
        Commands::Leave { plate } => commands::leave::run(&open(), &plate, json),
        Commands::List => commands::list::run(&open(), json),
        Commands::Status => commands::status::run(&open(), json),
        Commands::Levels => commands::levels::run(&open(), json),
        Commands::Level { action } => match action {
            LevelAction::Add => commands::level::add(&open(), json),
            LevelAction::Remove { level } => commands::level::remove(&open(), level, json),
        },
        Commands::Slot { action } => match action {
            SlotAction::Add { level, size } => commands::slot::add(&open(), level, size, json),
            SlotAction::Remove { level, slot } => {
                commands::slot::remove(&open(), level, slot, json)
            }
        },
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("layout error:") {
                EXIT_LAYOUT_ERROR
            } else if msg.starts_with("store error:") || msg.starts_with("storage unavailable:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
