use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "voicescreen")]
#[command(about = "Acoustic health screening from short voice recordings")]
pub struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze recordings and print their health indicators
    Analyze {
        /// WAV files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also print the clinical voice measures
        #[arg(long)]
        clinical: bool,

        /// Print the full analysis as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show the acoustic features of a recording
    Features {
        file: PathBuf,

        /// Dump every series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the 22-value clinical feature vector as one CSV line
    Vector {
        file: PathBuf,

        /// Print the column names first
        #[arg(long)]
        header: bool,
    },

    /// Run a screening session over one recording per test
    Screen {
        /// Deep breathing, about 10 seconds
        #[arg(long)]
        breathing: Option<PathBuf>,

        /// Sustained "Aaaaah"
        #[arg(long)]
        vowel: Option<PathBuf>,

        /// Counting from 1 to 20
        #[arg(long)]
        counting: Option<PathBuf>,

        /// Three natural coughs
        #[arg(long)]
        cough: Option<PathBuf>,

        /// Reading a paragraph aloud
        #[arg(long)]
        speech: Option<PathBuf>,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode, downmix and resample a recording, then write it as 16-bit WAV
    Normalize {
        input: PathBuf,

        /// Output path (defaults to <input>.normalized.wav)
        output: Option<PathBuf>,
    },

    /// Show where the config file is read from
    Paths,
}
