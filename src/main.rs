mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::filter::LevelFilter;

use voicescreen::analysis::TestKind;
use voicescreen::config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let app_config = || match config_path {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };

    match cli.command {
        Command::Analyze {
            files,
            clinical,
            json,
        } => commands::analyze(&files, clinical, json, &app_config()?),

        Command::Features { file, json } => commands::features(&file, json, &app_config()?),

        Command::Vector { file, header } => commands::vector(&file, header, &app_config()?),

        Command::Screen {
            breathing,
            vowel,
            counting,
            cough,
            speech,
            json,
        } => {
            let recordings: Vec<_> = [
                (TestKind::Breathing, breathing),
                (TestKind::Vowel, vowel),
                (TestKind::Counting, counting),
                (TestKind::Cough, cough),
                (TestKind::Speech, speech),
            ]
            .into_iter()
            .filter_map(|(kind, path)| path.map(|p| (kind, p)))
            .collect();
            commands::screen(&recordings, json, &app_config()?)
        }

        Command::Normalize { input, output } => {
            commands::normalize(&input, output.as_deref(), &app_config()?)
        }

        Command::Paths => {
            commands::show_paths(config_path);
            Ok(())
        }
    }
}
