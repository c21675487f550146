//! Runtime configuration.
//!
//! Loaded once at startup from a JSON file and passed by reference into the
//! constructors that need it. Nothing in the library reads configuration
//! from globals.
//!
//! ```json
//! {
//!   "pollIntervalMs": 2000,
//!   "library": { "booksPath": "/library/books", "booksTemplate": "{Author}/{Title}" },
//!   "torrentClient": { "kind": "qbittorrent", "url": "http://localhost:8080" },
//!   "remotePathMappings": [
//!     { "host": "qbittorrent", "remotePath": "/downloads", "localPath": "/mnt/downloads" }
//!   ]
//! }
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::mapping::{RemotePathMapping, deserialize_mappings};
use crate::task::ContentType;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_BOOKS_TEMPLATE: &str = "{Author}/{Title}";
pub const DEFAULT_AUDIOBOOKS_TEMPLATE: &str = "{Author}/{Series/}{Title}{ - PartNumber}";
pub const DEFAULT_TORRENT_CATEGORY: &str = "books";

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("failed to parse config {origin}: {source}")]
    Parse {
        /// Where the JSON came from, e.g. `file '/etc/shelver.json'`.
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("invalid config value for `{field}`: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn parse(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Wait between status polls, in milliseconds.
    pub poll_interval_ms: u64,
    pub library: LibraryConfig,
    pub torrent_client: Option<TorrentClientConfig>,
    /// Ordered longest remote prefix first.
    #[serde(deserialize_with = "deserialize_mappings")]
    pub remote_path_mappings: Vec<RemotePathMapping>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            library: LibraryConfig::default(),
            torrent_client: None,
            remote_path_mappings: Vec::new(),
        }
    }
}

/// Library placement settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LibraryConfig {
    pub books_path: Option<PathBuf>,
    pub audiobooks_path: Option<PathBuf>,
    pub books_template: String,
    pub audiobooks_template: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            books_path: None,
            audiobooks_path: None,
            books_template: DEFAULT_BOOKS_TEMPLATE.to_string(),
            audiobooks_template: DEFAULT_AUDIOBOOKS_TEMPLATE.to_string(),
        }
    }
}

impl LibraryConfig {
    /// Naming template for a content type.
    #[must_use]
    pub fn template_for(&self, content_type: ContentType) -> &str {
        match content_type {
            ContentType::Book => &self.books_template,
            ContentType::Audiobook => &self.audiobooks_template,
        }
    }

    /// Library root for a content type, if configured.
    #[must_use]
    pub fn path_for(&self, content_type: ContentType) -> Option<&Path> {
        match content_type {
            ContentType::Book => self.books_path.as_deref(),
            ContentType::Audiobook => self.audiobooks_path.as_deref(),
        }
    }
}

/// Supported torrent backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TorrentClientKind {
    #[default]
    Qbittorrent,
}

impl TorrentClientKind {
    /// Client name as reported by [`DownloadClient::name`](crate::client::DownloadClient::name).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qbittorrent => "qbittorrent",
        }
    }
}

/// Connection settings for the torrent backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentClientConfig {
    #[serde(default)]
    pub kind: TorrentClientKind,
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Category used when a task does not ask for a specific one.
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub audiobook_category: Option<String>,
}

fn default_category() -> String {
    DEFAULT_TORRENT_CATEGORY.to_string()
}

impl TorrentClientConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            kind: TorrentClientKind::default(),
            url: url.into(),
            username: String::new(),
            password: String::new(),
            category: default_category(),
            audiobook_category: None,
        }
    }
}

impl Config {
    /// Parses configuration from a JSON string and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::parse("string", source))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| {
            ConfigError::parse(format!("file '{}'", path.display()), source)
        })?;
        config.validate()?;

        debug!(
            path = %path.display(),
            mappings = config.remote_path_mappings.len(),
            torrent_client = config.torrent_client.is_some(),
            "loaded config file"
        );
        Ok(config)
    }

    /// Loads from [`default_config_path`], or returns defaults when no path is known.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::invalid(
                "pollIntervalMs",
                format!(
                    "{}. Expected range: 1..={MAX_POLL_INTERVAL_MS}",
                    self.poll_interval_ms
                ),
            ));
        }

        if let Some(client) = &self.torrent_client {
            let url = client.url.trim();
            if url.is_empty() {
                return Err(ConfigError::invalid("torrentClient.url", "must not be empty"));
            }
            if let Err(e) = url::Url::parse(url) {
                return Err(ConfigError::invalid(
                    "torrentClient.url",
                    format!("'{url}' is not a valid URL: {e}"),
                ));
            }
        }

        Ok(())
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Category to request for a task, or `None` to use the client's default.
    ///
    /// Only audiobooks get a dedicated category, and only when one is configured
    /// for the named client.
    #[must_use]
    pub fn category_for(&self, client_name: &str, content_type: ContentType) -> Option<String> {
        if !content_type.is_audiobook() {
            return None;
        }

        let client = self.torrent_client.as_ref()?;
        if client.kind.as_str() != client_name {
            return None;
        }

        client
            .audiobook_category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/shelver/config.json`
/// 2. `$HOME/.config/shelver/config.json`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("shelver").join("config.json"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("shelver")
            .join("config.json"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.library.books_template, DEFAULT_BOOKS_TEMPLATE);
        assert_eq!(config.library.audiobooks_template, DEFAULT_AUDIOBOOKS_TEMPLATE);
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_json_str(
            r#"{
                "pollIntervalMs": 500,
                "library": {"booksPath": "/library/books", "booksTemplate": "{Title}"},
                "torrentClient": {
                    "kind": "qbittorrent",
                    "url": "http://localhost:8080",
                    "username": "admin",
                    "password": "secret",
                    "audiobookCategory": "audiobooks"
                },
                "remotePathMappings": [
                    {"host": "qbittorrent", "remotePath": "/downloads", "localPath": "/mnt/dl"},
                    {"host": "qbittorrent"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.library.path_for(ContentType::Book), Some(Path::new("/library/books")));
        assert_eq!(config.library.path_for(ContentType::Audiobook), None);
        assert_eq!(config.library.template_for(ContentType::Book), "{Title}");
        let client = config.torrent_client.as_ref().unwrap();
        assert_eq!(client.category, DEFAULT_TORRENT_CATEGORY);
        assert_eq!(client.username, "admin");
        assert_eq!(config.remote_path_mappings.len(), 1);
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let err = Config::from_json_str(r#"{"pollIntervalMs": 0}"#).unwrap_err();
        assert!(err.to_string().contains("pollIntervalMs"), "got: {err}");
    }

    #[test]
    fn test_validate_rejects_bad_client_url() {
        let err = Config::from_json_str(r#"{"torrentClient": {"url": "not a url"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "torrentClient.url", .. }));

        let err = Config::from_json_str(r#"{"torrentClient": {"url": "  "}}"#).unwrap_err();
        assert!(err.to_string().contains("must not be empty"), "got: {err}");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = Config::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn test_category_for_audiobooks_only() {
        let mut config = Config::default();
        let mut client = TorrentClientConfig::new("http://localhost:8080");
        client.audiobook_category = Some("audiobooks".to_string());
        config.torrent_client = Some(client);

        assert_eq!(
            config.category_for("qbittorrent", ContentType::Audiobook).as_deref(),
            Some("audiobooks")
        );
        assert_eq!(config.category_for("qbittorrent", ContentType::Book), None);
        assert_eq!(config.category_for("sabnzbd", ContentType::Audiobook), None);
    }

    #[test]
    fn test_category_for_blank_category_is_none() {
        let mut config = Config::default();
        let mut client = TorrentClientConfig::new("http://localhost:8080");
        client.audiobook_category = Some("  ".to_string());
        config.torrent_client = Some(client);
        assert_eq!(config.category_for("qbittorrent", ContentType::Audiobook), None);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"pollIntervalMs": 250}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn test_load_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"), "got: {err}");
    }
}
