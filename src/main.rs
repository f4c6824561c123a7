//! CLI entry point for the filefetch tool.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use filefetch_core::download::filename::file_name_from_url;
use filefetch_core::{
    DownloadEngine, DownloadRequest, NoopProgressObserver, ProgressBarObserver, ProgressObserver,
};
use tracing::{debug, info};
use url::Url;

mod cli;

use cli::{Args, parse_header};

/// Fallback name when neither `--name` nor the URL yields one.
const DEFAULT_FILE_NAME: &str = "download.bin";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let file_name = match &args.name {
        Some(name) => name.clone(),
        None => Url::parse(&args.url)
            .ok()
            .and_then(|url| file_name_from_url(&url))
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
    };

    let show_progress = !args.no_progress && !args.quiet && io::stderr().is_terminal();

    let mut request =
        DownloadRequest::new(&args.url, &file_name).with_progress(show_progress);
    if let Some(folder) = &args.folder {
        request = request.with_subfolder(folder);
    }
    for raw in &args.headers {
        let (name, value) =
            parse_header(raw).with_context(|| format!("invalid --header value: {raw}"))?;
        request = request.with_header(name, value);
    }

    let observer: Arc<dyn ProgressObserver> = if show_progress {
        Arc::new(ProgressBarObserver::new())
    } else {
        Arc::new(NoopProgressObserver)
    };
    let engine = DownloadEngine::new(&args.out).with_observer(observer);

    let path = engine
        .download_file(request)
        .await
        .with_context(|| format!("failed to download {}", args.url))?;

    info!(path = %path.display(), "download complete");
    println!("{}", path.display());

    Ok(())
}
