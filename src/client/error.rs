//! Error types for backend download clients.
//!
//! Status queries never return these; a failing query yields a
//! [`DownloadStatus`](super::DownloadStatus) in the `error` state instead.
//! Errors surface only from submission and client construction.

use thiserror::Error;

/// Errors raised by a backend download client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend rejected the configured credentials.
    #[error("{client} authentication failed ({reason})")]
    Auth {
        /// Client display name (e.g., "qBittorrent").
        client: String,
        /// What the backend answered.
        reason: String,
    },

    /// The backend could not be reached.
    #[error("cannot connect to {client} at {url}: {source}")]
    Connection {
        client: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A request did not finish within the client's timeout.
    #[error("{client} request timed out at {url}")]
    Timeout { client: String, url: String },

    /// The backend answered with an unexpected HTTP status or body.
    #[error("{client} API request failed: {message}")]
    Api { client: String, message: String },

    /// No info-hash could be derived from the submitted URL.
    #[error("could not determine torrent hash from URL: {url}")]
    UnknownHash { url: String },

    /// A `.torrent` URL could not be fetched or did not hold a usable torrent.
    #[error("invalid torrent at {url}: {message}")]
    InvalidTorrent { url: String, message: String },

    /// The backend refused to add the download.
    #[error("{client} rejected download: {reason}")]
    Rejected { client: String, reason: String },

    /// The client configuration is unusable.
    #[error("invalid {client} configuration: {message}")]
    Config { client: String, message: String },
}

impl ClientError {
    /// Creates an authentication error.
    pub fn auth(client: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Auth {
            client: client.into(),
            reason: reason.into(),
        }
    }

    /// Maps a transport error to `Timeout` or `Connection`.
    pub fn transport(client: impl Into<String>, url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                client: client.into(),
                url: url.into(),
            }
        } else {
            Self::Connection {
                client: client.into(),
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an API error.
    pub fn api(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            client: client.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown-hash error.
    pub fn unknown_hash(url: impl Into<String>) -> Self {
        Self::UnknownHash { url: url.into() }
    }

    /// Creates an invalid-torrent error.
    pub fn invalid_torrent(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTorrent {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(client: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            client: client.into(),
            reason: reason.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(client: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            client: client.into(),
            message: message.into(),
        }
    }
}
