//! CLI entry point for the shelver tool.

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use shelver_core::client::info_hash_from_magnet;
use shelver_core::naming::{self, assign_part_numbers};
use shelver_core::{
    CallbackReporter, CancelFlag, ClientRegistry, CompletionPoller, Config, ContentType,
    DownloadRequest, DownloadTask, MetadataBag, MetadataValue, Protocol, StatusTag,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    init_tracing(&args);
    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Render {
            template,
            meta,
            no_path_separators,
        } => {
            let metadata = metadata_from_pairs(meta);
            println!("{}", naming::render(&template, &metadata, !no_path_separators));
        }
        Command::Path {
            base,
            template,
            meta,
            ext,
        } => {
            let metadata = metadata_from_pairs(meta);
            let path = naming::build_library_path(&base, &template, &metadata, ext.as_deref())
                .with_context(|| format!("Failed to build path under {}", base.display()))?;
            println!("{}", path.display());
        }
        Command::Parts { dir, pad } => {
            for (path, part) in list_parts(&dir, pad)? {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                println!("{part}\t{name}");
            }
        }
        Command::Fetch {
            url,
            title,
            audiobook,
        } => {
            let config = load_config(args.config.as_deref())?;
            let path = fetch(&config, url, title, audiobook, args.quiet).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Priority: `RUST_LOG` > quiet flag > verbose flag > default (info).
fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn metadata_from_pairs(pairs: Vec<(String, MetadataValue)>) -> MetadataBag {
    pairs.into_iter().collect()
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_default().context("Failed to load default config")?,
    };
    Ok(config)
}

fn list_parts(dir: &Path, pad: usize) -> Result<Vec<(PathBuf, String)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        if entry.file_type().is_ok_and(|t| t.is_file()) {
            files.push(entry.path());
        }
    }

    debug!(files = files.len(), dir = %dir.display(), "assigning part numbers");
    Ok(assign_part_numbers(&files, pad))
}

const CLI_SOURCE: &str = "cli";

/// Builds the task record for a CLI fetch.
///
/// The id is the release's info-hash when the URL is a magnet link, so
/// repeated fetches of one release share an id; otherwise it is a timestamp.
fn cli_task(url: &str, content_type: ContentType, title: Option<&str>) -> DownloadTask {
    let id = match info_hash_from_magnet(url) {
        Some(hash) => format!("{CLI_SOURCE}-{hash}"),
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("{CLI_SOURCE}-{millis}")
        }
    };

    let task = DownloadTask::new(id, CLI_SOURCE).with_content_type(content_type);
    match title {
        Some(title) => task.with_title(title),
        None => task,
    }
}

async fn fetch(
    config: &Config,
    url: String,
    title: Option<String>,
    audiobook: bool,
    quiet: bool,
) -> Result<PathBuf> {
    let registry = ClientRegistry::from_config(config).context("Failed to set up download client")?;
    let Some(client) = registry.get(Protocol::Torrent) else {
        bail!("No torrent client configured. Add a torrentClient section to the config file.");
    };

    let content_type = if audiobook {
        ContentType::Audiobook
    } else {
        ContentType::Book
    };
    let mut task = cli_task(&url, content_type, title.as_deref());

    let mut request = DownloadRequest::new(url)
        .with_category(config.category_for(client.name(), content_type));
    if let Some(title) = title {
        request = request.with_name(title);
    }

    let cancel = CancelFlag::new();
    let cancel_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling download");
            cancel_signal.cancel();
        }
    });

    let bar = progress_bar(!quiet && io::stderr().is_terminal());
    let failure: Mutex<Option<String>> = Mutex::new(None);
    let reporter = CallbackReporter::new(
        |percent| bar.set_position(percent_position(percent)),
        |tag, message: Option<&str>| {
            let message = message.unwrap_or_default();
            match tag {
                StatusTag::Error | StatusTag::Cancelled => {
                    if let Ok(mut slot) = failure.lock() {
                        *slot = Some(if message.is_empty() {
                            tag.to_string()
                        } else {
                            message.to_string()
                        });
                    }
                }
                StatusTag::Resolving | StatusTag::Downloading | StatusTag::Complete => {}
            }
            bar.set_message(format!("{tag}: {message}"));
        },
    );

    let poller = CompletionPoller::from_config(config);
    info!(client = client.name(), "starting download");
    let result = poller
        .run(client.as_ref(), &request, &mut task, &cancel, &reporter)
        .await;

    match result {
        Some(path) => {
            bar.finish_and_clear();
            Ok(path)
        }
        None => {
            bar.abandon();
            let reason = failure
                .lock()
                .ok()
                .and_then(|slot| slot.clone())
                .unwrap_or_else(|| "Download did not complete".to_string());
            bail!(reason)
        }
    }
}

fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_position(percent: f64) -> u64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0).round() as u64
    } else {
        0
    }
}
