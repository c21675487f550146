//! Library naming: template rendering, sanitizing, natural ordering and
//! traversal-safe path building.
//!
//! Everything here is a pure function over its inputs apart from the path
//! resolution in [`build_library_path`] and [`same_filesystem`], which read
//! filesystem metadata but never write.
//!
//! # Example
//!
//! ```
//! use shelver_core::naming::{MetadataBag, render};
//!
//! let metadata = MetadataBag::new()
//!     .with("Author", "Brandon Sanderson")
//!     .with("Title", "The Way of Kings");
//! assert_eq!(
//!     render("{Author}/{Series/}{Title}{ - Subtitle}", &metadata, true),
//!     "Brandon Sanderson/The Way of Kings"
//! );
//! ```

mod error;
mod metadata;
mod path;
mod sanitize;
mod sort;
mod template;

pub use error::NamingError;
pub use metadata::{MetadataBag, MetadataValue};
pub use path::{FALLBACK_NAME, build_library_path, same_filesystem};
pub use sanitize::{DEFAULT_MAX_LENGTH, sanitize, sanitize_with_limit};
pub use sort::{DEFAULT_PART_PAD_WIDTH, SORT_KEY_DIGITS, assign_part_numbers, path_sort_key, sort_key};
pub use template::{NamingTemplate, Segment, TemplateBlock, Token, render};
