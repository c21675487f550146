//! Completion poller: drives a single backend download from submission to a
//! resolved local path.
//!
//! # Lifecycle
//!
//! ```text
//! SUBMITTED -> POLLING -> COMPLETE | ERROR | CANCELLED
//! ```
//!
//! The poller never returns an error. Every failure becomes exactly one
//! status report and a `None` result; panics inside the poll loop are caught
//! and treated the same way.

mod cancel;
mod report;

pub use cancel::CancelFlag;
pub use report::{CallbackReporter, StatusReporter, StatusTag};

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Duration;

use futures_util::FutureExt;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{DownloadClient, DownloadState, host_identifier};
use crate::config::Config;
use crate::mapping::{RemotePathMapping, remap_remote_to_local, sort_mappings};
use crate::naming::FALLBACK_NAME;
use crate::task::DownloadTask;

const DEFAULT_FAILURE_MESSAGE: &str = "Download failed";

/// What to hand the backend when no existing download matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Display name for the backend; falls back to the task title.
    pub name: Option<String>,
    /// Backend category; `None` uses the client default.
    pub category: Option<String>,
}

impl DownloadRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

/// Polls a backend client until a download completes, fails, or is cancelled.
#[derive(Debug, Clone)]
pub struct CompletionPoller {
    poll_interval: Duration,
    mappings: Vec<RemotePathMapping>,
}

impl CompletionPoller {
    #[must_use]
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            mappings: Vec::new(),
        }
    }

    /// Uses `mappings` to translate backend paths into local ones.
    #[must_use]
    pub fn with_mappings(mut self, mut mappings: Vec<RemotePathMapping>) -> Self {
        sort_mappings(&mut mappings);
        self.mappings = mappings;
        self
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.poll_interval()).with_mappings(config.remote_path_mappings.clone())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Finds or submits the download for `request`, then polls it to a
    /// terminal state.
    ///
    /// Returns the local path of the finished download, recorded on `task`,
    /// or `None` after reporting why not.
    #[instrument(skip_all, fields(task_id = %task.task_id, client = client.name()))]
    pub async fn run(
        &self,
        client: &dyn DownloadClient,
        request: &DownloadRequest,
        task: &mut DownloadTask,
        cancel: &CancelFlag,
        reporter: &dyn StatusReporter,
    ) -> Option<PathBuf> {
        let outcome = AssertUnwindSafe(self.enter(client, request, task, cancel, reporter))
            .catch_unwind()
            .await;

        match outcome {
            Ok(path) => path,
            Err(payload) => {
                let message = format!("Unexpected error: {}", panic_message(payload.as_ref()));
                error!(error = %message, "download entry panicked");
                reporter.status(StatusTag::Error, Some(&message));
                None
            }
        }
    }

    async fn enter(
        &self,
        client: &dyn DownloadClient,
        request: &DownloadRequest,
        task: &mut DownloadTask,
        cancel: &CancelFlag,
        reporter: &dyn StatusReporter,
    ) -> Option<PathBuf> {
        reporter.status(
            StatusTag::Resolving,
            Some(&format!("Checking {}", client.name())),
        );

        let download_id = match client.find_existing(&request.url).await {
            Some((id, status)) if status.complete => {
                info!(download_id = %id, "found completed download");
                reporter.status(StatusTag::Resolving, Some("Found existing download"));
                return self.resolve_completed(client, &id, task, reporter).await;
            }
            Some((id, status)) => {
                info!(download_id = %id, progress = status.progress, "resuming existing download");
                reporter.status(StatusTag::Downloading, Some("Resuming existing download"));
                id
            }
            None => {
                reporter.status(
                    StatusTag::Resolving,
                    Some(&format!("Sending to {}", client.name())),
                );
                let name = request
                    .name
                    .as_deref()
                    .or(task.title.as_deref())
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(FALLBACK_NAME);

                match client
                    .add_download(&request.url, name, request.category.as_deref())
                    .await
                {
                    Ok(id) => {
                        info!(download_id = %id, "submitted download");
                        id
                    }
                    Err(e) => {
                        error!(error = %e, "failed to submit download");
                        reporter.status(
                            StatusTag::Error,
                            Some(&format!("Failed to add to {}: {e}", client.name())),
                        );
                        return None;
                    }
                }
            }
        };

        self.poll_until_complete(client, &download_id, task, cancel, reporter)
            .await
    }

    /// Polls `download_id` until it completes, fails, or `cancel` is set.
    ///
    /// A panic inside the loop is reported once and followed by a best-effort
    /// removal of the download with its files.
    #[instrument(skip(self, client, task, cancel, reporter), fields(client = client.name()))]
    pub async fn poll_until_complete(
        &self,
        client: &dyn DownloadClient,
        download_id: &str,
        task: &mut DownloadTask,
        cancel: &CancelFlag,
        reporter: &dyn StatusReporter,
    ) -> Option<PathBuf> {
        let outcome = AssertUnwindSafe(self.poll_loop(client, download_id, task, cancel, reporter))
            .catch_unwind()
            .await;

        match outcome {
            Ok(path) => path,
            Err(payload) => {
                let message = format!("Unexpected error: {}", panic_message(payload.as_ref()));
                error!(download_id, error = %message, "poll loop panicked");
                reporter.status(StatusTag::Error, Some(&message));

                let removal = AssertUnwindSafe(client.remove(download_id, true))
                    .catch_unwind()
                    .await;
                match removal {
                    Ok(true) => {}
                    Ok(false) => warn!(download_id, "failed to remove download after error"),
                    Err(_) => warn!(download_id, "removal panicked after error"),
                }
                None
            }
        }
    }

    async fn poll_loop(
        &self,
        client: &dyn DownloadClient,
        download_id: &str,
        task: &mut DownloadTask,
        cancel: &CancelFlag,
        reporter: &dyn StatusReporter,
    ) -> Option<PathBuf> {
        debug!(download_id, interval_ms = self.poll_interval.as_millis(), "polling download");

        while !cancel.is_cancelled() {
            let status = client.get_status(download_id).await;
            reporter.progress(status.progress);

            if status.complete {
                if status.is_error() {
                    let message = failure_message(status.message.as_deref());
                    error!(download_id, error = message, "download finished with error");
                    reporter.status(StatusTag::Error, Some(message));
                    return None;
                }
                debug!(download_id, "download complete");
                break;
            }

            if status.is_error() {
                let message = failure_message(status.message.as_deref());
                error!(download_id, error = message, "download failed");
                reporter.status(StatusTag::Error, Some(message));
                remove_quietly(client, download_id, "error").await;
                return None;
            }

            let tag = if status.state == DownloadState::Processing {
                StatusTag::Resolving
            } else {
                StatusTag::Downloading
            };
            reporter.status(tag, Some(&status.display_message()));

            if cancel.wait(self.poll_interval).await {
                break;
            }
        }

        if cancel.is_cancelled() {
            info!(download_id, "download cancelled");
            remove_quietly(client, download_id, "cancellation").await;
            reporter.status(StatusTag::Cancelled, Some("Cancelled"));
            return None;
        }

        self.resolve_completed(client, download_id, task, reporter)
            .await
    }

    /// Maps the backend path of a finished download into the local view and
    /// checks that it exists.
    async fn resolve_completed(
        &self,
        client: &dyn DownloadClient,
        download_id: &str,
        task: &mut DownloadTask,
        reporter: &dyn StatusReporter,
    ) -> Option<PathBuf> {
        let remote = client
            .get_download_path(download_id)
            .await
            .filter(|path| !path.trim().is_empty());

        let Some(remote) = remote else {
            error!(download_id, "backend returned no path for completed download");
            reporter.status(
                StatusTag::Error,
                Some(&format!(
                    "Download completed in {} (id {download_id}) but path not returned. \
                     Check volume mappings and category settings.",
                    client.name()
                )),
            );
            return None;
        };

        let local = match host_identifier(client) {
            Some(host) => remap_remote_to_local(&self.mappings, &host, &remote),
            None => PathBuf::from(&remote),
        };

        if tokio::fs::metadata(&local).await.is_err() {
            error!(download_id, path = %local.display(), "completed download not visible locally");
            reporter.status(
                StatusTag::Error,
                Some(&format!(
                    "Path not accessible: {}. Check volume mappings between {} and this host.",
                    local.display(),
                    client.name()
                )),
            );
            return None;
        }

        task.record_download_path(&local);
        info!(download_id, path = %local.display(), "download complete");
        reporter.status(StatusTag::Complete, Some("Download complete"));
        Some(local)
    }
}

fn failure_message(message: Option<&str>) -> &str {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_FAILURE_MESSAGE)
}

async fn remove_quietly(client: &dyn DownloadClient, download_id: &str, reason: &str) {
    if !client.remove(download_id, true).await {
        warn!(download_id, reason, "failed to remove download");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in download poller".to_string()
    }
}
