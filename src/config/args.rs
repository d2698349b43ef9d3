//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// emuhost - real-time pacing host for cycle-stepped emulators
///
/// Drives a built-in test tone emulator through the run loop and audio queue
#[derive(Parser, Debug)]
#[command(name = "emuhost")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log output to file
    #[arg(long, global = true)]
    pub log: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the test tone emulator through the host
    Run {
        /// Stop after this many seconds (runs until Ctrl+C if omitted)
        #[arg(short, long)]
        seconds: Option<f64>,

        /// Audio frames per device buffer, overriding the settings file
        #[arg(short, long)]
        frames: Option<u32>,

        /// Tone frequency in Hz
        #[arg(long, default_value = "440")]
        tone: f64,

        /// Pause after this many seconds, then resume one second later
        #[arg(long)]
        pause_at: Option<f64>,

        /// Use the native audio device instead of the paced software sink
        #[arg(long)]
        native: bool,
    },

    /// Print a sample settings file
    Config,
}

impl Args {
    /// Get the log level based on verbose/quiet flags
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }
}

impl Default for Command {
    fn default() -> Self {
        Command::Run {
            seconds: None,
            frames: None,
            tone: 440.0,
            pause_at: None,
            native: false,
        }
    }
}
