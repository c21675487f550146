//! Normalized download status shared by every backend client.

use std::fmt;

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Normalized state of a download, independent of the backend's own vocabulary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadState {
    Downloading,
    Seeding,
    Paused,
    Queued,
    Checking,
    /// Server-side post-processing (moving, verifying, extracting).
    Processing,
    Complete,
    Error,
    #[default]
    Unknown,
}

impl DownloadState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Downloading => "downloading",
            Self::Seeding => "seeding",
            Self::Paused => "paused",
            Self::Queued => "queued",
            Self::Checking => "checking",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a download's progress as reported by a backend client.
///
/// Every poll produces a fresh value; snapshots are never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadStatus {
    /// Percent complete, 0 to 100.
    pub progress: f64,
    pub state: DownloadState,
    /// Backend-supplied message, shown verbatim when present.
    pub message: Option<String>,
    /// True when the backend considers the transfer finished. May be paired
    /// with [`DownloadState::Error`] for "finished, but failed".
    pub complete: bool,
    /// Path of the finished download as seen by the backend.
    pub file_path: Option<String>,
    /// Bytes per second.
    pub download_speed: Option<u64>,
    /// Seconds remaining.
    pub eta: Option<u64>,
}

impl DownloadStatus {
    #[must_use]
    pub fn new(progress: f64, state: DownloadState) -> Self {
        Self {
            progress,
            state,
            ..Self::default()
        }
    }

    /// An `error` snapshot carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: DownloadState::Error,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// A finished snapshot at 100% with an optional resolved path.
    #[must_use]
    pub fn completed(file_path: Option<String>) -> Self {
        Self {
            progress: 100.0,
            state: DownloadState::Complete,
            message: Some("Complete".to_string()),
            complete: true,
            file_path,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_speed(mut self, bytes_per_sec: u64) -> Self {
        self.download_speed = Some(bytes_per_sec);
        self
    }

    #[must_use]
    pub fn with_eta(mut self, seconds: u64) -> Self {
        self.eta = Some(seconds);
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.state == DownloadState::Error
    }

    /// Human-readable progress line: the backend message when it sent one,
    /// otherwise e.g. `"42% (1.5 MB/s) - 3m left"`.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => self.progress_message(),
        }
    }

    /// Synthesizes a progress line from percentage, speed and ETA.
    #[must_use]
    pub fn progress_message(&self) -> String {
        let mut msg = format!("{:.0}%", self.progress);

        if let Some(speed) = self.download_speed.filter(|s| *s > 0) {
            #[allow(clippy::cast_precision_loss)]
            let mb = speed as f64 / BYTES_PER_MB;
            msg.push_str(&format!(" ({mb:.1} MB/s)"));
        }

        if let Some(eta) = self.eta.filter(|e| *e > 0) {
            msg.push_str(" - ");
            msg.push_str(&format_eta(eta));
        }

        msg
    }
}

fn format_eta(seconds: u64) -> String {
    match seconds {
        0..60 => format!("{seconds}s left"),
        60..3600 => format!("{}m left", seconds / 60),
        _ => format!("{}h {}m left", seconds / 3600, (seconds % 3600) / 60),
    }
}
