//! timbral CLI - audio descriptor extraction from the command line.

mod commands;
mod framing;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timbral")]
#[command(author, version, about = "Audio feature extraction", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract features frame by frame
    Analyze(commands::analyze::AnalyzeArgs),

    /// Track pitch with the wavelet estimator
    Pitch(commands::pitch::PitchArgs),

    /// Linear prediction and cepstral coefficients of one frame
    Lpc(commands::lpc::LpcArgs),

    /// Detect onsets
    Onset(commands::onset::OnsetArgs),

    /// Convert a file's sample rate by a rational factor
    Resample(commands::resample::ResampleArgs),

    /// List available features
    Features(commands::features::FeaturesArgs),

    /// List and manage analysis profiles
    Profiles(commands::profiles::ProfilesArgs),

    /// Show WAV file information
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Pitch(args) => commands::pitch::run(args),
        Commands::Lpc(args) => commands::lpc::run(args),
        Commands::Onset(args) => commands::onset::run(args),
        Commands::Resample(args) => commands::resample::run(args),
        Commands::Features(args) => commands::features::run(args),
        Commands::Profiles(args) => commands::profiles::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
