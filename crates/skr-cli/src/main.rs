//! CLI frontend for Skroll interactive-fiction scripts.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "skr",
    about = "Skroll: write, check and play branching stories",
    version,
    propagate_version = true
)]
struct Cli {
    /// Print debug logging (otherwise RUST_LOG decides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a script and report diagnostics
    Check {
        /// Script file (.skr)
        file: PathBuf,
    },

    /// Parse a script and write the built script as JSON
    Build {
        /// Script file (.skr)
        file: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the story, scene and beat tree as a table
    Outline {
        /// Script file (.skr)
        file: PathBuf,
    },

    /// Play a story in the terminal
    Play {
        /// Script file (.skr) or built script (.json)
        file: PathBuf,

        /// Start in this scene instead of the configured one
        #[arg(short, long)]
        scene: Option<String>,

        /// Make these choices in order and print the transcript (number, id or label)
        #[arg(short, long = "choose")]
        choose: Vec<String>,
    },

    /// Write a new script from the starter template
    New {
        /// Story id, stored in the metadata fence
        id: String,

        /// File to create (default: `<id>.skr`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let result = match cli.command {
        Commands::Check { file } => commands::check::run(&file),
        Commands::Build { file, output } => commands::build::run(&file, output.as_deref()),
        Commands::Outline { file } => commands::outline::run(&file),
        Commands::Play {
            file,
            scene,
            choose,
        } => commands::play::run(&file, scene.as_deref(), &choose),
        Commands::New { id, output } => commands::new::run(&id, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
