//! Protocol to backend client lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Config, TorrentClientKind};

use super::{ClientError, DownloadClient, Protocol, QBittorrentClient};

/// Holds at most one configured client per protocol.
#[derive(Default)]
pub struct ClientRegistry {
    clients: HashMap<Protocol, Arc<dyn DownloadClient>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds clients for every backend present in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] when a configured client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        let mut registry = Self::new();

        if let Some(torrent) = &config.torrent_client {
            match torrent.kind {
                TorrentClientKind::Qbittorrent => {
                    registry.register(Arc::new(QBittorrentClient::new(torrent)?));
                }
            }
        }

        debug!(clients = registry.clients.len(), "built client registry");
        Ok(registry)
    }

    /// Registers `client` for its protocol, replacing any previous one.
    pub fn register(&mut self, client: Arc<dyn DownloadClient>) {
        let protocol = client.protocol();
        info!(client = client.name(), protocol = %protocol, "registered download client");
        self.clients.insert(protocol, client);
    }

    /// Client handling `protocol`, if one is configured.
    #[must_use]
    pub fn get(&self, protocol: Protocol) -> Option<Arc<dyn DownloadClient>> {
        self.clients.get(&protocol).cloned()
    }

    /// Names of all configured clients.
    #[must_use]
    pub fn configured_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.values().map(|c| c.name().to_string()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.configured_names())
            .finish()
    }
}
