use clap::{Args, Parser, Subcommand};
use squeeze::engine::{BackendChoice, FrameRate, Resolution};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "squeeze", version)]
#[command(
    about = "Re-encode every video under a directory tree in place",
    long_about = None
)]
pub struct Cli {
    /// Root directory to process (defaults to current directory)
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Index of the planned directory to start from (see `squeeze scan`)
    #[arg(short, long, value_name = "INDEX", allow_negative_numbers = true)]
    pub start: Option<i64>,

    /// Prompt for every setting not given on the command line
    #[arg(short, long)]
    pub interactive: bool,

    /// Only write the log file; don't echo it to stdout
    #[arg(short, long)]
    pub quiet: bool,

    /// Show debug diagnostics on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Encode settings shared by the batch run and `dry-run`
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// original, 1080p, 720p, 480p, 360p or WIDTHxHEIGHT
    #[arg(short, long, value_name = "RES")]
    pub resolution: Option<Resolution>,

    /// original, N or N/D
    #[arg(short, long, value_name = "FPS")]
    pub fps: Option<FrameRate>,

    /// Encoder threads (clamped to the number of cores)
    #[arg(short, long)]
    pub threads: Option<u32>,

    /// auto, software, qsv or vaapi
    #[arg(short, long, value_name = "BACKEND")]
    pub backend: Option<BackendChoice>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe hardware encoders and show which backend would be used
    CheckHw {
        /// Print the probe results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the directory plan and leftover temporary files without encoding
    Scan {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,
    },

    /// Show ffmpeg commands without executing (dry run)
    DryRun {
        /// Directory to scan (defaults to current directory)
        directory: Option<PathBuf>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// Index of the planned directory to start from
        #[arg(short, long, value_name = "INDEX", allow_negative_numbers = true)]
        start: Option<i64>,
    },

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
