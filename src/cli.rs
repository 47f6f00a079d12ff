//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::OutputFormat;
use crate::config::CliOverrides;

/// Crop images to their content and center it on a fixed-size canvas
#[derive(Debug, Parser)]
#[command(name = "centerframe", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./centerframe.toml or the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Persisted settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub settings_file: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress normal output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Process one image
    Process(ProcessArgs),
    /// Show or change persisted settings
    Settings(SettingsArgs),
    /// Show version, config locations and effective defaults
    Info,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Input image, or '-' to read from stdin
    pub input: String,

    /// Output file or directory (default: next to the input)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Square canvas edge for this run
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub size: Option<i64>,

    /// Canvas width for this run
    #[arg(long)]
    pub width: Option<i64>,

    /// Canvas height for this run
    #[arg(long)]
    pub height: Option<i64>,

    /// Margin in pixels for this run
    #[arg(long, conflicts_with = "margin_percent")]
    pub margin: Option<i64>,

    /// Margin as a percentage of the canvas edge for this run
    #[arg(long)]
    pub margin_percent: Option<f64>,

    /// Background color (#rgb, #rrggbb, #rrggbbaa) for this run
    #[arg(long, value_name = "HEX")]
    pub background: Option<String>,

    /// Channel value above which a pixel is background (0-255)
    #[arg(long)]
    pub white_threshold: Option<u8>,

    /// Alpha at or below which a pixel is background (0-255)
    #[arg(long)]
    pub alpha_threshold: Option<u8>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// JPEG quality (1-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Also write a 500x500 preview image
    #[arg(long, value_name = "PATH")]
    pub preview: Option<PathBuf>,

    /// Also write the source with the detected box outlined
    #[arg(long, value_name = "PATH")]
    pub debug_bbox: Option<PathBuf>,

    /// Print the output as a data URL instead of writing a file
    #[arg(long)]
    pub data_url: bool,

    /// Show what would be done without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl ProcessArgs {
    /// True when the input comes from stdin
    pub fn is_stdin(&self) -> bool {
        self.input == "-"
    }

    /// True when any canvas flag was given
    pub fn has_layout_overrides(&self) -> bool {
        self.size.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.margin.is_some()
            || self.margin_percent.is_some()
            || self.background.is_some()
    }

    /// Pipeline-level CLI overrides
    pub fn overrides(&self, settings_file: Option<PathBuf>) -> CliOverrides {
        CliOverrides {
            white_threshold: self.white_threshold,
            alpha_threshold: self.alpha_threshold,
            output_format: self.format,
            jpeg_quality: self.quality,
            settings_file,
        }
    }
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsAction,
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Set one field; invalid values are clamped or reverted
    Set {
        /// mode, final_size, margin_percentage, final_width, final_height,
        /// margin_size or background_color
        field: String,
        value: String,
    },
    /// Restore defaults
    Reset,
}
