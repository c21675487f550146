//! Backend download clients.
//!
//! A backend is an external torrent or usenet client that performs the actual
//! transfer. The poller only ever talks to it through [`DownloadClient`].
//!
//! # Architecture
//!
//! - [`DownloadClient`] - Async trait every backend implements
//! - [`ClientRegistry`] - Protocol to client lookup, built from configuration
//! - [`DownloadStatus`] - Normalized per-poll snapshot
//! - [`QBittorrentClient`] - qBittorrent Web API backend

mod error;
mod hash;
mod qbittorrent;
mod registry;
mod status;

pub use error::ClientError;
pub use hash::{hashes_match, info_hash_from_magnet, info_hash_from_torrent};
pub use qbittorrent::QBittorrentClient;
pub use registry::ClientRegistry;
pub use status::{DownloadState, DownloadStatus};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Transfer protocol a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Torrent,
    Usenet,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Torrent => "torrent",
            Self::Usenet => "usenet",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract every backend download client implements.
///
/// Implementations own their session state and must be safe to share across
/// concurrent pollers.
///
/// # Object Safety
///
/// Uses `async_trait` so the registry can hold `Arc<dyn DownloadClient>`.
#[async_trait]
pub trait DownloadClient: Send + Sync {
    /// Short lowercase name used in messages and remote path mappings.
    fn name(&self) -> &str;

    fn protocol(&self) -> Protocol;

    /// Looks for a download already present in the backend for `url`.
    async fn find_existing(&self, url: &str) -> Option<(String, DownloadStatus)>;

    /// Submits a download and returns the backend-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the backend refuses or cannot be reached.
    async fn add_download(
        &self,
        url: &str,
        name: &str,
        category: Option<&str>,
    ) -> Result<String, ClientError>;

    /// Current status. Failures are reported as an `error` status, never raised.
    async fn get_status(&self, download_id: &str) -> DownloadStatus;

    /// Backend-side path of a finished download, `None` when not resolvable yet.
    async fn get_download_path(&self, download_id: &str) -> Option<String>;

    /// Removes a download, optionally deleting its files. Returns success.
    async fn remove(&self, download_id: &str, delete_files: bool) -> bool;
}

/// Identifier used to match a client against remote path mappings: its name,
/// trimmed and lowercased. `None` for a blank name.
#[must_use]
pub fn host_identifier(client: &dyn DownloadClient) -> Option<String> {
    let name = client.name().trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}
