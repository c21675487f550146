//! Library path construction confined to a base directory.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::error::NamingError;
use super::metadata::MetadataBag;
use super::sanitize::sanitize;
use super::template::render;

/// Name used when neither the template nor the title yields anything.
pub const FALLBACK_NAME: &str = "Unknown";

/// Builds the absolute destination path for a library entry.
///
/// The template is rendered with path separators allowed. An empty result
/// falls back to the sanitized title, then to [`FALLBACK_NAME`]. Every `..`
/// is removed from the relative part before it is joined onto `base`, and the
/// resolved result must still lie inside the resolved `base`.
///
/// `extension` is appended to the last component rather than replacing an
/// existing suffix, so `"2.5 - Title"` becomes `"2.5 - Title.epub"`.
///
/// # Errors
///
/// Returns [`NamingError::PathTraversal`] when the resolved path escapes
/// `base` (for example through a symlink inside the library), and
/// [`NamingError::Io`] when `base` cannot be made absolute.
pub fn build_library_path(
    base: impl AsRef<Path>,
    template: &str,
    metadata: &MetadataBag,
    extension: Option<&str>,
) -> Result<PathBuf, NamingError> {
    let base = base.as_ref();

    let mut relative = render(template, metadata, true);
    if relative.is_empty() {
        let title = metadata.text("title").map(|t| sanitize(&t)).unwrap_or_default();
        relative = if title.is_empty() {
            FALLBACK_NAME.to_string()
        } else {
            title
        };
        debug!(template, fallback = %relative, "template rendered empty, using fallback name");
    }

    let relative = relative.replace("..", "");

    let resolved_base = resolve_lenient(base).map_err(|e| NamingError::io(base, e))?;
    let candidate = resolved_base.join(&relative);
    let resolved = resolve_lenient(&candidate).map_err(|e| NamingError::io(&candidate, e))?;

    if !resolved.starts_with(&resolved_base) {
        warn!(
            base = %resolved_base.display(),
            candidate = %resolved.display(),
            "rendered path escapes library directory"
        );
        return Err(NamingError::path_traversal(resolved_base, resolved));
    }

    Ok(match extension.map(|ext| ext.trim_start_matches('.')) {
        Some(ext) if !ext.is_empty() => append_extension(resolved, ext),
        _ => resolved,
    })
}

fn append_extension(path: PathBuf, extension: &str) -> PathBuf {
    let mut raw: OsString = path.into_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

/// Makes `path` absolute and resolves symlinks for the part that exists.
///
/// Unlike [`Path::canonicalize`] the path need not exist: components past the
/// deepest existing ancestor are appended lexically, with `..` popping one level.
fn resolve_lenient(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut resolved = PathBuf::new();

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                if let Ok(canonical) = resolved.canonicalize() {
                    resolved = canonical;
                }
            }
        }
    }

    Ok(resolved)
}

/// Reports whether two paths live on the same filesystem.
///
/// Each path is walked up to its nearest existing ancestor before comparing
/// device ids, so a destination that has not been created yet still works.
/// Returns `false` when either device cannot be determined; callers then copy
/// instead of hardlinking.
#[must_use]
pub fn same_filesystem(a: &Path, b: &Path) -> bool {
    match (device_id(a), device_id(b)) {
        (Some(left), Some(right)) => left == right,
        _ => {
            warn!(
                left = %a.display(),
                right = %b.display(),
                "cannot determine filesystem for hardlink check, falling back to copy"
            );
            false
        }
    }
}

#[cfg(unix)]
fn nearest_existing(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    let mut current = absolute.as_path();
    while !current.exists() {
        current = current.parent()?;
    }
    Some(current.to_path_buf())
}

#[cfg(unix)]
fn device_id(path: &Path) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;

    let existing = nearest_existing(path)?;
    match std::fs::metadata(&existing) {
        Ok(meta) => Some(meta.dev()),
        Err(e) => {
            debug!(path = %existing.display(), error = %e, "cannot stat path");
            None
        }
    }
}

#[cfg(not(unix))]
fn device_id(path: &Path) -> Option<u64> {
    debug!(path = %path.display(), "device ids unavailable on this platform");
    None
}
