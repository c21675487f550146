//! Remote path mapping.
//!
//! A download client often runs in another mount namespace (a separate
//! container, NAS or host) and reports paths that do not exist locally. A
//! mapping rewrites a remote path prefix into the matching local prefix before
//! the path is checked or handed to the transfer stage.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// One `(host, remote prefix, local prefix)` rewrite rule.
///
/// Values built through [`RemotePathMapping::new`] are normalized: the host is
/// trimmed and lowercased, both prefixes use forward slashes and carry no
/// trailing slash unless they are the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePathMapping {
    host: String,
    remote_path: String,
    local_path: String,
}

impl RemotePathMapping {
    /// Builds a normalized mapping, or `None` when any field is blank.
    #[must_use]
    pub fn new(host: &str, remote_path: &str, local_path: &str) -> Option<Self> {
        let host = normalize_host(host);
        let remote_path = normalize_prefix(remote_path);
        let local_path = normalize_prefix(local_path);

        if host.is_empty() || remote_path.is_empty() || local_path.is_empty() {
            return None;
        }

        Some(Self {
            host,
            remote_path,
            local_path,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    #[must_use]
    pub fn local_path(&self) -> &str {
        &self.local_path
    }

    /// Returns the path with the remote prefix swapped for the local one, or
    /// `None` when the prefix does not cover `remote` on a segment boundary.
    fn apply(&self, remote: &str) -> Option<PathBuf> {
        let remainder = if self.remote_path == "/" {
            remote.strip_prefix('/')?
        } else if remote == self.remote_path {
            ""
        } else {
            remote
                .strip_prefix(self.remote_path.as_str())?
                .strip_prefix('/')?
        };

        let local = PathBuf::from(&self.local_path);
        Some(if remainder.is_empty() {
            local
        } else {
            local.join(remainder)
        })
    }
}

/// Parses mapping rows from untyped configuration.
///
/// Rows that are not objects, or whose `host`, `remotePath` or `localPath` is
/// missing or blank, are skipped. The result is ordered longest remote prefix
/// first; rows with equal prefix lengths keep their configured order.
#[must_use]
pub fn parse_mappings(value: &Value) -> Vec<RemotePathMapping> {
    let Some(rows) = value.as_array() else {
        return Vec::new();
    };

    let mut mappings: Vec<RemotePathMapping> = rows
        .iter()
        .filter_map(|row| {
            let row = row.as_object()?;
            let field = |key: &str| row.get(key).and_then(Value::as_str).unwrap_or_default();
            let mapping =
                RemotePathMapping::new(field("host"), field("remotePath"), field("localPath"));
            if mapping.is_none() {
                trace!(?row, "skipping incomplete remote path mapping");
            }
            mapping
        })
        .collect();

    sort_mappings(&mut mappings);
    mappings
}

/// Orders mappings longest remote prefix first, stable for ties.
pub fn sort_mappings(mappings: &mut [RemotePathMapping]) {
    mappings.sort_by_key(|m| std::cmp::Reverse(m.remote_path.len()));
}

/// Serde adapter for lenient mapping lists inside configuration structs.
///
/// # Errors
///
/// Only fails when the input is not valid JSON at all; malformed rows are skipped.
pub fn deserialize_mappings<'de, D>(deserializer: D) -> Result<Vec<RemotePathMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_mappings(&value))
}

/// Translates a path reported by the client named `host` into the local view.
///
/// `mappings` must already be ordered longest prefix first (as produced by
/// [`parse_mappings`]); the first matching mapping wins. Without a match the
/// normalized path is returned. A blank `remote_path` is returned unchanged.
#[must_use]
pub fn remap_remote_to_local(mappings: &[RemotePathMapping], host: &str, remote_path: &str) -> PathBuf {
    let host = normalize_host(host);
    let remote = normalize_prefix(remote_path);

    if remote.is_empty() {
        return PathBuf::from(remote_path);
    }

    for mapping in mappings.iter().filter(|m| m.host == host) {
        if let Some(local) = mapping.apply(&remote) {
            debug!(
                host = %host,
                remote = %remote,
                local = %local.display(),
                "remapped remote download path"
            );
            return local;
        }
    }

    PathBuf::from(remote)
}

fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

fn normalize_prefix(path: &str) -> String {
    let normalized = path.trim().replace('\\', "/");
    if normalized == "/" {
        return normalized;
    }
    normalized.trim_end_matches('/').to_string()
}
