use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, ExportCommand, ImportCommand, InitCommand, MovementCommand, PlanCommand,
    StatsCommand, TrainingCommand,
};
use config::Config;
use sportlib_core::SportsLibrary;

#[derive(Parser)]
#[command(name = "sportlib")]
#[command(version)]
#[command(about = "Running plans, trainings and tracks", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open (and on first use populate) the library
    Init(InitCommand),

    /// Manage running plans
    Plan(PlanCommand),

    /// Show movement types
    Movement(MovementCommand),

    /// Record and list trainings
    Training(TrainingCommand),

    /// Export data as JSON
    Export(ExportCommand),

    /// Import data from JSON
    Import(ImportCommand),

    /// Show record counts per entity type
    Stats(StatsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportlib=info,sportlib_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config)?;

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let mut library = SportsLibrary::open(config.data_dir.value.clone())?;
    let repo = library.repository();

    let result = match command {
        Commands::Init(cmd) => cmd.run(&library),
        Commands::Plan(cmd) => cmd.run(repo),
        Commands::Movement(cmd) => cmd.run(repo),
        Commands::Training(cmd) => cmd.run(repo),
        Commands::Export(cmd) => cmd.run(repo),
        Commands::Import(cmd) => cmd.run(repo),
        Commands::Stats(cmd) => cmd.run(repo),
        Commands::Config(_) => Ok(()),
    };

    library.close();
    result
}
