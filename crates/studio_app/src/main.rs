mod platform;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Terminal front end for the video stylization and chat backend.
#[derive(Debug, Parser)]
#[command(name = "studio")]
#[command(about = "Stylize videos and chat with the studio backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// RON config file; `./studio.ron` is used when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL.
    #[arg(long, env = "STUDIO_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Seconds between status polls.
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Directory for downloaded results.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a video with a style prompt and follow the job to the end.
    Stylize {
        file: PathBuf,

        #[arg(long, short)]
        prompt: String,

        /// Save the stylized result into the output directory.
        #[arg(long)]
        download: bool,
    },
    /// Interactive chat; `/clear` resets the conversation, `/quit` exits.
    Chat {
        /// Send the whole conversation with every request.
        #[arg(long)]
        full_history: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::run_app(cli)
}
