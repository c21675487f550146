//! Shelver Core Library
//!
//! Names, places, and fetches book and audiobook files into a library tree.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`naming`] - Naming templates, filename sanitizing, natural sort, and confined path building
//! - [`mapping`] - Translation of backend-reported paths into the local filesystem view
//! - [`client`] - Backend download client contract, registry, and the qBittorrent backend
//! - [`poller`] - Completion poller that drives one download to a resolved local path
//! - [`task`] - Download task records owned by the caller
//! - [`config`] - Configuration value object loaded once at startup

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod mapping;
pub mod naming;
pub mod poller;
pub mod task;

// Re-export commonly used types
pub use client::{
    ClientError, ClientRegistry, DownloadClient, DownloadState, DownloadStatus, Protocol,
    QBittorrentClient,
};
pub use config::{Config, ConfigError};
pub use mapping::{RemotePathMapping, remap_remote_to_local};
pub use naming::{MetadataBag, MetadataValue, NamingError, NamingTemplate, build_library_path};
pub use poller::{
    CallbackReporter, CancelFlag, CompletionPoller, DownloadRequest, StatusReporter, StatusTag,
};
pub use task::{ContentType, DownloadTask};
