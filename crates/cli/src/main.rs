mod config_cmd;
mod input;
mod lanes_cmd;
mod markers_cmd;
mod output;
mod related_cmd;
mod replay_cmd;
mod search_cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stepline", version, about = "stepline - lay out and explore execution timelines")]
struct Cli {
    /// Config file (defaults to $STEPLINE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack items into non-overlapping lanes
    Lanes(lanes_cmd::LanesArgs),

    /// Time markers for a viewport
    Markers(markers_cmd::MarkersArgs),

    /// Search items by name or type and walk the matches
    Search(search_cmd::SearchArgs),

    /// Items related to a focus id
    Related(related_cmd::RelatedArgs),

    /// Apply a JSONL stream of engine events and print every output
    Replay(replay_cmd::ReplayArgs),

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default stepline.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Lanes(args) => lanes_cmd::run(args, config_path),
        Commands::Markers(args) => markers_cmd::run(args, config_path),
        Commands::Search(args) => search_cmd::run(args, config_path),
        Commands::Related(args) => related_cmd::run(args, config_path),
        Commands::Replay(args) => replay_cmd::run(args, config_path),
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(config_path),
            ConfigAction::Init { force } => config_cmd::init(config_path, force),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
