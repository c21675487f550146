//! Natural ordering of filenames and sequential part numbering.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Width every digit run is padded to in a sort key.
pub const SORT_KEY_DIGITS: usize = 9;

/// Default zero-pad width for assigned part numbers.
pub const DEFAULT_PART_PAD_WIDTH: usize = 2;

#[allow(clippy::expect_used)]
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run regex is valid"));

/// Builds a natural-sort key for a filename.
///
/// The name is lowercased and every maximal run of digits is left-padded with
/// zeros to [`SORT_KEY_DIGITS`], so `"Part 2"` orders before `"Part 10"`.
/// Runs longer than the pad width are kept as-is.
#[must_use]
pub fn sort_key(filename: &str) -> String {
    let lowered = filename.to_lowercase();
    DIGIT_RUN
        .replace_all(&lowered, |caps: &Captures<'_>| {
            format!("{:0>width$}", &caps[0], width = SORT_KEY_DIGITS)
        })
        .into_owned()
}

/// Natural-sort key over the final component of a path.
#[must_use]
pub fn path_sort_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    sort_key(&name)
}

/// Sorts files naturally by filename and assigns sequential part numbers.
///
/// Numbering starts at 1 and each number is zero-padded to `pad_width` digits.
/// Files whose keys compare equal keep their input order.
#[must_use]
pub fn assign_part_numbers(files: &[PathBuf], pad_width: usize) -> Vec<(PathBuf, String)> {
    let mut sorted = files.to_vec();
    sorted.sort_by_cached_key(|path| path_sort_key(path));

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, path)| {
            let part = format!("{:0width$}", index + 1, width = pad_width);
            (path, part)
        })
        .collect()
}
