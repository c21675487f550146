//! Caller-owned download task records.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Kind of content a task fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Book,
    Audiobook,
}

impl ContentType {
    #[must_use]
    pub fn is_audiobook(self) -> bool {
        self == Self::Audiobook
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
            Self::Audiobook => "audiobook",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single acquisition tracked by the caller.
///
/// The poller borrows the task mutably only to record where the backend
/// actually stored the finished download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTask {
    pub task_id: String,
    pub content_type: ContentType,
    pub title: Option<String>,
    /// Tag naming where the release came from (e.g., "prowlarr", "cli").
    pub source: String,
    original_download_path: Option<PathBuf>,
}

impl DownloadTask {
    #[must_use]
    pub fn new(task_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            content_type: ContentType::default(),
            title: None,
            source: source.into(),
            original_download_path: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Local path of the finished download, once known.
    #[must_use]
    pub fn original_download_path(&self) -> Option<&Path> {
        self.original_download_path.as_deref()
    }

    /// Records where the finished download lives in the local filesystem view.
    pub fn record_download_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!(task_id = %self.task_id, path = %path.display(), "recorded download path");
        self.original_download_path = Some(path);
    }
}
