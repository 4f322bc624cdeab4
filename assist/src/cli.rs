//! CLI argument definitions.

use clap::Parser;
use std::path::PathBuf;

use crate::collectors::Category;
use crate::config::AssistConfig;

/// Workstation troubleshooting assistant.
///
/// Collects system, hardware and symptom-specific logs into a single archive
/// for support staff. Must be run as root.
#[derive(Parser, Debug)]
#[command(name = "troubleshoot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (can be repeated for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file
    #[arg(short, long, env = "TROUBLESHOOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for the report files and the archive (default: your home)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Use a numbered menu instead of the arrow-key menu
    #[arg(long)]
    pub plain: bool,

    /// Install tools a category needs when they are missing
    #[arg(long)]
    pub install_missing: bool,

    /// Gather these categories without prompting (repeatable)
    #[arg(long = "category", value_enum)]
    pub categories: Vec<Category>,
}

impl Cli {
    /// Apply command-line overrides to a loaded configuration.
    pub fn apply(&self, config: &mut AssistConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if self.install_missing {
            config.install_missing = true;
        }
    }

    /// Run without menus.
    pub fn unattended(&self) -> bool {
        !self.categories.is_empty()
    }
}
