//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch a file over HTTP(S) into local storage.
///
/// Probes the URL first, streams the transfer to a temporary artifact, then
/// moves it into place under the output directory, showing per-file
/// progress while it runs.
#[derive(Parser, Debug)]
#[command(name = "filefetch")]
#[command(author, version, about)]
pub struct Args {
    /// URL of the file to download
    pub url: String,

    /// Destination file name (derived from the URL when omitted)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Subfolder under the output directory
    #[arg(short, long)]
    pub folder: Option<String>,

    /// Extra request header as "Name: Value" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Output directory (root of the storage area)
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Splits a raw `--header` value into a (name, value) pair.
///
/// Returns `None` when there is no colon or the name part is empty.
pub fn parse_header(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
