//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use shelver_core::MetadataValue;
use shelver_core::naming::DEFAULT_PART_PAD_WIDTH;

/// Name, place, and fetch book and audiobook files.
///
/// Shelver renders naming templates into confined library paths and drives
/// a torrent client until a download lands on disk.
#[derive(Parser, Debug)]
#[command(name = "shelver")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/shelver/config.json)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a naming template against metadata
    Render {
        /// Template, e.g. "{Author}/{Series/}{Title}"
        template: String,

        /// Metadata value as key=value (repeatable)
        #[arg(short, long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<(String, MetadataValue)>,

        /// Strip '/' from values instead of keeping them as directory separators
        #[arg(long)]
        no_path_separators: bool,
    },

    /// Build a library path confined to a base directory
    Path {
        /// Library root
        base: PathBuf,

        /// Template, e.g. "{Author}/{Title}"
        template: String,

        /// Metadata value as key=value (repeatable)
        #[arg(short, long = "meta", value_name = "KEY=VALUE", value_parser = parse_meta)]
        meta: Vec<(String, MetadataValue)>,

        /// File extension to append
        #[arg(long)]
        ext: Option<String>,
    },

    /// List the files of a directory with their assigned part numbers
    Parts {
        dir: PathBuf,

        /// Zero-pad width of part numbers
        #[arg(long, default_value_t = DEFAULT_PART_PAD_WIDTH)]
        pad: usize,
    },

    /// Send a URL to the configured torrent client and wait for completion
    Fetch {
        /// Magnet URI
        url: String,

        /// Title used as the download name
        #[arg(long)]
        title: Option<String>,

        /// Treat the download as an audiobook (uses the audiobook category)
        #[arg(long)]
        audiobook: bool,
    },
}

/// Parses `key=value`. Series positions are kept numeric so `1.0` renders as `1`.
fn parse_meta(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }

    let value = if key.eq_ignore_ascii_case("seriesposition") {
        if let Ok(n) = value.trim().parse::<i64>() {
            MetadataValue::Integer(n)
        } else if let Ok(n) = value.trim().parse::<f64>() {
            MetadataValue::Decimal(n)
        } else {
            MetadataValue::from(value)
        }
    } else {
        MetadataValue::from(value)
    };

    Ok((key.to_string(), value))
}
