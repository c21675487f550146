//! qBittorrent backend over the Web API v2.
//!
//! Session auth is cookie based: a form login sets `SID`, which the client's
//! cookie store replays on every request. qBittorrent answers 403 once that
//! session expires, so each request re-authenticates and retries exactly once.
//!
//! Torrents are identified by their info-hash. Magnet links carry it; HTTP
//! release URLs are fetched and either redirect to a magnet link or serve a
//! `.torrent` file, which is hashed locally and uploaded as-is. Lookups
//! tolerate emulators (e.g. Amarr) that report zero-padded ed2k hashes, see
//! [`hashes_match`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION, REFERER};
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;
use url::form_urlencoded;

use crate::config::TorrentClientConfig;

use super::hash::{hashes_match, info_hash_from_magnet, info_hash_from_torrent};
use super::{ClientError, DownloadClient, DownloadState, DownloadStatus, Protocol};

const NAME: &str = "qbittorrent";
const DISPLAY_NAME: &str = "qBittorrent";

const REQUEST_TIMEOUT_SECS: u64 = 10;
/// ETAs at or above one week are qBittorrent's "infinite" marker.
const MAX_ETA_SECS: i64 = 604_800;
const LOGIN_OK: &str = "Ok.";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const MAX_TORRENT_REDIRECTS: usize = 10;

const DEFAULT_ADD_POLL_ATTEMPTS: usize = 10;
const DEFAULT_ADD_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Row of `GET /api/v2/torrents/info`.
///
/// Rows are read field by field: a missing, `null` or wrongly typed field
/// takes its default instead of failing the whole listing.
#[derive(Debug, Clone, Default, PartialEq)]
struct TorrentInfo {
    hash: String,
    name: String,
    state: String,
    progress: f64,
    eta: Option<i64>,
    dlspeed: Option<i64>,
    content_path: String,
    save_path: String,
}

impl TorrentInfo {
    /// Returns `None` for rows that are not JSON objects.
    #[allow(clippy::cast_possible_truncation)]
    fn from_row(row: &Value) -> Option<Self> {
        let row = row.as_object()?;
        let text = |key: &str| {
            row.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let integer = |key: &str| {
            row.get(key)
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        };

        Some(Self {
            hash: text("hash"),
            name: text("name"),
            state: text("state"),
            progress: row
                .get("progress")
                .and_then(Value::as_f64)
                .filter(|p| p.is_finite())
                .unwrap_or_default(),
            eta: integer("eta"),
            dlspeed: integer("dlspeed"),
            content_path: text("content_path"),
            save_path: text("save_path"),
        })
    }
}

/// What a release URL resolves to before it is handed to qBittorrent.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TorrentSource {
    /// Submitted by URL.
    Magnet { hash: String, uri: String },
    /// A downloaded `.torrent` file, uploaded as-is.
    File { hash: String, data: Vec<u8> },
}

impl TorrentSource {
    fn hash(&self) -> &str {
        match self {
            Self::Magnet { hash, .. } | Self::File { hash, .. } => hash,
        }
    }
}

/// qBittorrent Web API client.
pub struct QBittorrentClient {
    http: Client,
    /// Fetches `.torrent` files. Stops at redirects to non-HTTP targets so a
    /// magnet `Location` can be read instead of followed.
    fetcher: Client,
    base_url: String,
    username: String,
    password: String,
    category: String,
    logged_in: AtomicBool,
    add_poll_attempts: usize,
    add_poll_interval: Duration,
}

impl std::fmt::Debug for QBittorrentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QBittorrentClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl QBittorrentClient {
    /// Builds a client from configuration. No network traffic happens until
    /// the first request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an unusable URL or when the HTTP
    /// client cannot be constructed.
    pub fn new(config: &TorrentClientConfig) -> Result<Self, ClientError> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::config(DISPLAY_NAME, "URL is required"));
        }
        Url::parse(&base_url).map_err(|e| {
            ClientError::config(DISPLAY_NAME, format!("invalid URL '{base_url}': {e}"))
        })?;

        let http = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                ClientError::config(DISPLAY_NAME, format!("HTTP client construction failed: {e}"))
            })?;

        let fetcher = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .redirect(Policy::custom(|attempt| {
                let web = matches!(attempt.url().scheme(), "http" | "https");
                if web && attempt.previous().len() < MAX_TORRENT_REDIRECTS {
                    attempt.follow()
                } else {
                    attempt.stop()
                }
            }))
            .build()
            .map_err(|e| {
                ClientError::config(DISPLAY_NAME, format!("HTTP client construction failed: {e}"))
            })?;

        Ok(Self {
            http,
            fetcher,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
            category: config.category.clone(),
            logged_in: AtomicBool::new(false),
            add_poll_attempts: DEFAULT_ADD_POLL_ATTEMPTS,
            add_poll_interval: DEFAULT_ADD_POLL_INTERVAL,
        })
    }

    /// Overrides how long `add_download` waits for a new torrent to appear.
    #[must_use]
    pub fn with_add_poll(mut self, attempts: usize, interval: Duration) -> Self {
        self.add_poll_attempts = attempts;
        self.add_poll_interval = interval;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{path}", self.base_url)
    }

    fn endpoint_with_query(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Url, ClientError> {
        Url::parse_with_params(&self.endpoint(path), params)
            .map_err(|e| ClientError::config(DISPLAY_NAME, format!("invalid endpoint URL: {e}")))
    }

    fn get(&self, url: &Url) -> RequestBuilder {
        self.http
            .get(url.clone())
            .header(REFERER, self.base_url.as_str())
    }

    fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> RequestBuilder {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.http
            .post(self.endpoint(path))
            .header(REFERER, self.base_url.as_str())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
    }

    fn post_torrent_file(&self, data: &[u8], category: &str, name: &str) -> RequestBuilder {
        let file = Part::bytes(data.to_vec()).file_name("release.torrent");
        let form = Form::new()
            .part("torrents", file)
            .text("category", category.to_string())
            .text("rename", name.to_string());
        self.http
            .post(self.endpoint("torrents/add"))
            .header(REFERER, self.base_url.as_str())
            .multipart(form)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        request
            .send()
            .await
            .map_err(|e| ClientError::transport(DISPLAY_NAME, &self.base_url, e))
    }

    async fn login(&self) -> Result<(), ClientError> {
        let request = self.post_form(
            "auth/login",
            &[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ],
        );
        let response = self.send(request).await?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(DISPLAY_NAME, &self.base_url, e))?;

        if status.is_success() && body.trim() == LOGIN_OK {
            self.logged_in.store(true, Ordering::Release);
            debug!(client = NAME, "logged in");
            return Ok(());
        }

        self.logged_in.store(false, Ordering::Release);
        let reason = if status.is_success() {
            format!("login rejected: {}", body.trim())
        } else {
            format!("HTTP {}", status.as_u16())
        };
        warn!(client = NAME, reason = %reason, "login failed");
        Err(ClientError::auth(DISPLAY_NAME, reason))
    }

    async fn ensure_login(&self) -> Result<(), ClientError> {
        if self.logged_in.load(Ordering::Acquire) {
            return Ok(());
        }
        self.login().await
    }

    /// Sends the request built by `build`, re-authenticating and retrying once on 403.
    async fn send_authenticated<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        self.ensure_login().await?;
        let mut response = self.send(build()).await?;

        if response.status() == StatusCode::FORBIDDEN {
            debug!(client = NAME, "HTTP 403, re-authenticating and retrying");
            self.logged_in.store(false, Ordering::Release);
            self.login().await?;
            response = self.send(build()).await?;
        }

        if response.status() == StatusCode::FORBIDDEN {
            warn!(client = NAME, "authentication failed (HTTP 403)");
            return Err(ClientError::auth(DISPLAY_NAME, "HTTP 403"));
        }

        Ok(response)
    }

    async fn get_authenticated(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        let url = self.endpoint_with_query(path, params)?;
        self.send_authenticated(|| self.get(&url)).await
    }

    async fn fetch_torrents(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<TorrentInfo>, ClientError> {
        let response = self.get_authenticated("torrents/info", params).await?;
        let response = require_success(response)?;
        let rows = response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| ClientError::api(DISPLAY_NAME, format!("invalid torrent list: {e}")))?;

        let torrents: Vec<TorrentInfo> = rows.iter().filter_map(TorrentInfo::from_row).collect();
        if torrents.len() < rows.len() {
            debug!(
                client = NAME,
                skipped = rows.len() - torrents.len(),
                "skipped non-object torrent rows"
            );
        }
        Ok(torrents)
    }

    /// Lists torrents, narrowing to `hash` when given.
    ///
    /// An empty hash-filtered answer falls back to listing the configured
    /// category, then everything, since emulators often ignore the `hashes`
    /// filter and per-task categories (audiobooks) live outside the default one.
    async fn torrents_info(&self, hash: Option<&str>) -> Result<Vec<TorrentInfo>, ClientError> {
        let Some(hash) = hash else {
            return self.fetch_torrents(&[]).await;
        };

        let torrents = self.fetch_torrents(&[("hashes", hash)]).await?;
        if !torrents.is_empty() {
            return Ok(torrents);
        }

        if !self.category.is_empty() {
            let by_category = self
                .fetch_torrents(&[("category", self.category.as_str())])
                .await?;
            if !by_category.is_empty() {
                return Ok(by_category);
            }
        }

        self.fetch_torrents(&[]).await
    }

    async fn find_torrent(&self, hash: &str) -> Result<Option<TorrentInfo>, ClientError> {
        let torrents = self.torrents_info(Some(hash)).await?;
        Ok(torrents
            .into_iter()
            .find(|t| !t.hash.is_empty() && hashes_match(&t.hash, hash)))
    }

    async fn is_torrent_loaded(&self, hash: &str) -> Result<bool, ClientError> {
        let response = self
            .get_authenticated("torrents/properties", &[("hash", hash)])
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(ClientError::api(
                DISPLAY_NAME,
                format!("HTTP {}", status.as_u16()),
            )),
        }
    }

    async fn ensure_category(&self, category: &str) {
        let result = self
            .send_authenticated(|| {
                self.post_form("torrents/createCategory", &[("category", category)])
            })
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                debug!(client = NAME, category, "created category");
            }
            Ok(response) if response.status() == StatusCode::CONFLICT => {}
            Ok(response) => debug!(
                client = NAME,
                category,
                status = response.status().as_u16(),
                "could not create category"
            ),
            Err(e) => debug!(client = NAME, category, error = %e, "could not create category"),
        }
    }

    async fn status_for(&self, torrent: &TorrentInfo) -> DownloadStatus {
        let (state, message) = map_state(&torrent.state);
        let complete = torrent.progress >= 1.0 && torrent.state != "moving";

        let eta = torrent
            .eta
            .filter(|eta| (1..MAX_ETA_SECS).contains(eta))
            .and_then(|eta| u64::try_from(eta).ok());
        let download_speed = torrent.dlspeed.and_then(|speed| u64::try_from(speed).ok());

        if complete {
            let file_path = self.resolve_completed_path(torrent).await;
            return DownloadStatus {
                progress: torrent.progress * 100.0,
                download_speed,
                eta,
                ..DownloadStatus::completed(file_path)
            };
        }

        DownloadStatus {
            progress: torrent.progress * 100.0,
            state,
            message,
            complete: false,
            file_path: None,
            download_speed,
            eta,
        }
    }

    /// Resolves where a finished torrent's content lives on the backend host.
    ///
    /// `content_path` is used unless it equals `save_path` (emulators report
    /// the save directory there). Otherwise the path is derived from the
    /// torrent's properties and file list, and finally from `save_path + name`.
    async fn resolve_completed_path(&self, torrent: &TorrentInfo) -> Option<String> {
        if !torrent.content_path.is_empty()
            && (torrent.save_path.is_empty() || torrent.content_path != torrent.save_path)
        {
            return Some(torrent.content_path.clone());
        }

        if !torrent.hash.is_empty()
            && let Some(derived) = self.derive_path_from_files(&torrent.hash).await
        {
            return Some(derived);
        }

        if torrent.save_path.is_empty() || torrent.name.is_empty() {
            return None;
        }
        Some(join_remote(&torrent.save_path, &torrent.name))
    }

    async fn derive_path_from_files(&self, hash: &str) -> Option<String> {
        let properties = self.get_json("torrents/properties", hash).await?;
        let save_path = properties
            .get("save_path")
            .or_else(|| properties.get("savePath"))
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())?
            .to_string();

        let files = self.get_json("torrents/files", hash).await?;
        let first_name = files
            .as_array()?
            .first()?
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())?
            .replace('\\', "/");
        let top_level = first_name.split('/').next().filter(|s| !s.is_empty())?;

        Some(join_remote(&save_path, top_level))
    }

    /// Resolves a release URL to its info-hash.
    ///
    /// Magnet links are parsed locally. HTTP URLs are fetched: a redirect to a
    /// magnet link is used as that magnet, anything else must be a `.torrent`
    /// file, whose bytes are kept for upload.
    #[instrument(skip_all, fields(client = NAME))]
    async fn resolve_source(&self, url: &str) -> Result<TorrentSource, ClientError> {
        if let Some(hash) = info_hash_from_magnet(url) {
            return Ok(TorrentSource::Magnet {
                hash,
                uri: url.to_string(),
            });
        }

        let parsed = Url::parse(url.trim()).map_err(|_| ClientError::unknown_hash(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::unknown_hash(url));
        }

        let response = self
            .fetcher
            .get(parsed)
            .send()
            .await
            .map_err(|e| ClientError::invalid_torrent(url, format!("download failed: {e}")))?;
        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default();
            if let Some(hash) = info_hash_from_magnet(location) {
                debug!(download_id = %hash, "torrent URL redirected to magnet link");
                return Ok(TorrentSource::Magnet {
                    hash,
                    uri: location.to_string(),
                });
            }
            return Err(ClientError::invalid_torrent(
                url,
                format!("HTTP {} redirect without a magnet link", status.as_u16()),
            ));
        }
        if !status.is_success() {
            return Err(ClientError::invalid_torrent(
                url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| ClientError::invalid_torrent(url, format!("download failed: {e}")))?
            .to_vec();
        let hash = info_hash_from_torrent(&data).map_err(|m| ClientError::invalid_torrent(url, m))?;
        debug!(download_id = %hash, bytes = data.len(), "fetched torrent file");
        Ok(TorrentSource::File { hash, data })
    }

    async fn get_json(&self, path: &str, hash: &str) -> Option<Value> {
        let response = match self.get_authenticated(path, &[("hash", hash)]).await {
            Ok(response) => response,
            Err(e) => {
                debug!(client = NAME, path, error = %e, "could not derive path from files");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(
                client = NAME,
                path,
                status = response.status().as_u16(),
                "could not derive path from files"
            );
            return None;
        }
        response.json::<Value>().await.ok()
    }
}

#[async_trait]
impl DownloadClient for QBittorrentClient {
    fn name(&self) -> &str {
        NAME
    }

    fn protocol(&self) -> Protocol {
        Protocol::Torrent
    }

    async fn find_existing(&self, url: &str) -> Option<(String, DownloadStatus)> {
        let source = match self.resolve_source(url).await {
            Ok(source) => source,
            Err(e) => {
                debug!(client = NAME, error = %e, "find_existing could not resolve URL");
                return None;
            }
        };
        let torrent = match self.find_torrent(source.hash()).await {
            Ok(found) => found?,
            Err(e) => {
                debug!(client = NAME, error = %e, "find_existing lookup failed");
                return None;
            }
        };

        let id = torrent.hash.to_lowercase();
        info!(client = NAME, download_id = %id, "found existing torrent");
        Some((id, self.status_for(&torrent).await))
    }

    #[instrument(skip(self, url), fields(client = NAME))]
    async fn add_download(
        &self,
        url: &str,
        name: &str,
        category: Option<&str>,
    ) -> Result<String, ClientError> {
        let category = category
            .filter(|c| !c.is_empty())
            .unwrap_or(self.category.as_str());
        let source = self.resolve_source(url).await?;
        let expected_hash = source.hash().to_string();

        self.ensure_category(category).await;

        let response = match &source {
            TorrentSource::Magnet { uri, .. } => {
                self.send_authenticated(|| {
                    self.post_form(
                        "torrents/add",
                        &[("urls", uri.as_str()), ("category", category), ("rename", name)],
                    )
                })
                .await?
            }
            TorrentSource::File { data, .. } => {
                self.send_authenticated(|| self.post_torrent_file(data, category, name))
                    .await?
            }
        };
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::transport(DISPLAY_NAME, &self.base_url, e))?;
        if !status.is_success() || body.trim() != LOGIN_OK {
            let reason = if body.trim().is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                body.trim().to_string()
            };
            warn!(reason = %reason, "torrent add rejected");
            return Err(ClientError::rejected(DISPLAY_NAME, reason));
        }

        for attempt in 1..=self.add_poll_attempts {
            match self.is_torrent_loaded(&expected_hash).await {
                Ok(true) => {
                    info!(download_id = %expected_hash, "added torrent");
                    return Ok(expected_hash);
                }
                Ok(false) => {}
                Err(e) => debug!(attempt, error = %e, "torrent visibility check failed"),
            }
            if attempt < self.add_poll_attempts {
                tokio::time::sleep(self.add_poll_interval).await;
            }
        }

        warn!(download_id = %expected_hash, "torrent not yet visible, returning expected hash");
        Ok(expected_hash)
    }

    async fn get_status(&self, download_id: &str) -> DownloadStatus {
        match self.find_torrent(download_id).await {
            Ok(Some(torrent)) => self.status_for(&torrent).await,
            Ok(None) => DownloadStatus::error("Torrent not found in qBittorrent"),
            Err(e) => {
                warn!(client = NAME, download_id, error = %e, "status query failed");
                DownloadStatus::error(e.to_string())
            }
        }
    }

    async fn get_download_path(&self, download_id: &str) -> Option<String> {
        match self.find_torrent(download_id).await {
            Ok(Some(torrent)) => self.resolve_completed_path(&torrent).await,
            Ok(None) => None,
            Err(e) => {
                debug!(client = NAME, download_id, error = %e, "download path lookup failed");
                None
            }
        }
    }

    async fn remove(&self, download_id: &str, delete_files: bool) -> bool {
        let delete_flag = if delete_files { "true" } else { "false" };
        let result = self
            .send_authenticated(|| {
                self.post_form(
                    "torrents/delete",
                    &[("hashes", download_id), ("deleteFiles", delete_flag)],
                )
            })
            .await
            .and_then(require_success);

        match result {
            Ok(_) => {
                info!(client = NAME, download_id, delete_files, "removed torrent");
                true
            }
            Err(e) => {
                warn!(client = NAME, download_id, error = %e, "failed to remove torrent");
                false
            }
        }
    }
}

fn require_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::api(DISPLAY_NAME, format!("HTTP {}", status.as_u16())))
    }
}

/// Maps a qBittorrent state string to a normalized state and display message.
/// `None` means the caller should synthesize a progress message.
fn map_state(raw: &str) -> (DownloadState, Option<String>) {
    let (state, message) = match raw {
        "downloading" | "forcedDL" => (DownloadState::Downloading, None),
        "stalledDL" => (DownloadState::Downloading, Some("Stalled")),
        "metaDL" | "forcedMetaDL" => (DownloadState::Downloading, Some("Fetching metadata")),
        "allocating" => (DownloadState::Downloading, Some("Allocating space")),
        "uploading" | "forcedUP" => (DownloadState::Seeding, Some("Seeding")),
        "stalledUP" => (DownloadState::Seeding, Some("Seeding (stalled)")),
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => {
            (DownloadState::Paused, Some("Paused"))
        }
        "queuedDL" | "queuedUP" => (DownloadState::Queued, Some("Queued")),
        "checkingDL" | "checkingUP" => (DownloadState::Checking, Some("Checking files")),
        "checkingResumeData" => (DownloadState::Checking, Some("Checking resume data")),
        "moving" => (DownloadState::Processing, Some("Moving files")),
        "error" => (DownloadState::Error, Some("Error")),
        "missingFiles" => (DownloadState::Error, Some("Missing files")),
        "unknown" => (DownloadState::Unknown, Some("Unknown state")),
        other => return (DownloadState::Unknown, Some(other.to_string())),
    };
    (state, message.map(str::to_string))
}

/// Joins a backend path and a child name with `/`, as qBittorrent reports
/// forward slashes even on Windows hosts.
fn join_remote(base: &str, child: &str) -> String {
    let base = base.trim_end_matches(['/', '\\']);
    if base.is_empty() {
        return format!("/{child}");
    }
    format!("{base}/{child}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_map_state_table() {
        assert_eq!(map_state("downloading"), (DownloadState::Downloading, None));
        assert_eq!(
            map_state("stalledDL"),
            (DownloadState::Downloading, Some("Stalled".to_string()))
        );
        assert_eq!(
            map_state("stoppedUP"),
            (DownloadState::Paused, Some("Paused".to_string()))
        );
        assert_eq!(
            map_state("moving"),
            (DownloadState::Processing, Some("Moving files".to_string()))
        );
        assert_eq!(
            map_state("missingFiles"),
            (DownloadState::Error, Some("Missing files".to_string()))
        );
    }

    #[test]
    fn test_map_state_unknown_keeps_raw_state() {
        assert_eq!(
            map_state("someNewState"),
            (DownloadState::Unknown, Some("someNewState".to_string()))
        );
    }

    #[test]
    fn test_join_remote() {
        assert_eq!(join_remote("/downloads/", "Book"), "/downloads/Book");
        assert_eq!(join_remote("C:\\Downloads\\", "Book"), "C:\\Downloads/Book");
        assert_eq!(join_remote("/", "Book"), "/Book");
    }

    #[test]
    fn test_new_rejects_empty_url() {
        let err = QBittorrentClient::new(&TorrentClientConfig::new("  ")).unwrap_err();
        assert!(matches!(err, ClientError::Config { .. }), "got: {err}");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client =
            QBittorrentClient::new(&TorrentClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(client.endpoint("auth/login"), "http://localhost:8080/api/v2/auth/login");
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = TorrentClientConfig::new("http://localhost:8080");
        config.password = "hunter2".to_string();
        let client = QBittorrentClient::new(&config).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"), "password leaked: {debug}");
    }

    #[test]
    fn test_torrent_info_tolerates_missing_fields() {
        let row = serde_json::json!({"hash": "abc", "progress": 0.5});
        let info = TorrentInfo::from_row(&row).unwrap();
        assert_eq!(info.hash, "abc");
        assert!(info.eta.is_none());
        assert!(info.content_path.is_empty());
    }

    #[test]
    fn test_torrent_info_tolerates_null_and_mistyped_fields() {
        let row = serde_json::json!({
            "hash": 12345,
            "name": null,
            "state": "downloading",
            "progress": "half",
            "eta": 60.0,
            "dlspeed": null,
            "content_path": null,
            "save_path": ["/downloads"]
        });
        let info = TorrentInfo::from_row(&row).unwrap();
        assert_eq!(
            info,
            TorrentInfo {
                state: "downloading".to_string(),
                eta: Some(60),
                ..TorrentInfo::default()
            },
            "Bad fields should fall back to defaults"
        );
    }

    #[test]
    fn test_torrent_info_skips_non_object_rows() {
        assert!(TorrentInfo::from_row(&serde_json::json!("abc")).is_none());
        assert!(TorrentInfo::from_row(&Value::Null).is_none());
    }
}
