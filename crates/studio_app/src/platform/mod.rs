mod app;
mod config;
mod effects;
mod media;
mod ui;

use std::str::FromStr;

use anyhow::Context;
use log::LevelFilter;

use crate::{Cli, Command};
use config::{AppConfig, Overrides};

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let full_history = matches!(cli.command, Command::Chat { full_history: true });
    let overrides = Overrides {
        api_base: cli.api_base,
        poll_interval_secs: cli.poll_interval,
        output_dir: cli.output_dir,
        full_history,
    };
    let config = AppConfig::load(cli.config.as_deref(), overrides)?;

    let level = LevelFilter::from_str(&cli.log_level)
        .ok()
        .with_context(|| format!("invalid log level {:?}", cli.log_level))?;
    studio_logging::initialize(&config.log_destination, level);
    config.log_summary();

    match cli.command {
        Command::Stylize {
            file,
            prompt,
            download,
        } => app::run_stylize(&config, &file, &prompt, download),
        Command::Chat { .. } => app::run_chat(&config),
    }
}
