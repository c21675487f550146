//! Naming template engine.
//!
//! A template is literal text interleaved with `{...}` blocks. Each block holds
//! free-form prefix text, one known token and free-form suffix text, e.g.
//! `{Vol. SeriesPosition - }`. When the token's metadata value is missing the
//! whole block disappears, prefix and suffix included, which is how a single
//! template covers both "series present" and "series absent" books.
//!
//! Blocks without a known token are kept verbatim, braces included.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::metadata::MetadataBag;
use super::sanitize::sanitize;

/// A metadata field recognized inside a template block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    SeriesPosition,
    PartNumber,
    Subtitle,
    Author,
    Series,
    Title,
    Year,
}

impl Token {
    /// Match priority, longest name first so `seriesposition` wins over `series`.
    pub const PRIORITY: [Self; 7] = [
        Self::SeriesPosition,
        Self::PartNumber,
        Self::Subtitle,
        Self::Author,
        Self::Series,
        Self::Title,
        Self::Year,
    ];

    /// Lowercase metadata key for this token.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::SeriesPosition => "seriesposition",
            Self::PartNumber => "partnumber",
            Self::Subtitle => "subtitle",
            Self::Author => "author",
            Self::Series => "series",
            Self::Title => "title",
            Self::Year => "year",
        }
    }

    /// Resolves this token's display value, trimmed. Empty means "missing".
    fn resolve(self, metadata: &MetadataBag) -> String {
        let Some(value) = metadata.get(self.key()) else {
            return String::new();
        };
        let raw = match self {
            Self::SeriesPosition => value.series_position(),
            _ => value.to_string(),
        };
        raw.trim().to_string()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One `{prefix token suffix}` block found while scanning a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBlock {
    pub prefix: String,
    pub token: Token,
    pub suffix: String,
}

impl TemplateBlock {
    /// Splits the inner text of a block around the highest-priority token it contains.
    ///
    /// Matching is case-insensitive and unanchored. Returns `None` when no known
    /// token occurs in `content`.
    #[must_use]
    pub fn parse(content: &str) -> Option<Self> {
        // ASCII lowercasing keeps byte offsets aligned with `content`.
        let lowered = content.to_ascii_lowercase();
        Token::PRIORITY.iter().find_map(|&token| {
            let start = lowered.find(token.key())?;
            let end = start + token.key().len();
            Some(Self {
                prefix: content[..start].to_string(),
                token,
                suffix: content[end..].to_string(),
            })
        })
    }

    /// Renders the block, or returns an empty string when the token has no value.
    #[must_use]
    pub fn render(&self, metadata: &MetadataBag, allow_path_separators: bool) -> String {
        let value = self.token.resolve(metadata);
        if value.is_empty() {
            return String::new();
        }

        let value = if allow_path_separators {
            value
        } else {
            value.replace('/', "_")
        };

        format!("{}{}{}", self.prefix, sanitize(&value), self.suffix)
    }
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output unchanged, including unrecognized `{...}` spans.
    Literal(String),
    Block(TemplateBlock),
}

/// A parsed naming template such as `{Author}/{Series/}{Title}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl NamingTemplate {
    /// Scans `source` for `{...}` spans.
    ///
    /// The first `}` after a `{` closes the span and spans do not nest. An empty
    /// `{}` or a `{` with no closing brace stays literal. Parsing never fails.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };

            if close == 0 {
                literal.push_str(&rest[..=open]);
                rest = after;
                continue;
            }

            literal.push_str(&rest[..open]);
            match TemplateBlock::parse(&after[..close]) {
                Some(block) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Block(block));
                }
                None => literal.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: source.to_string(),
            segments,
        }
    }

    /// The template text this was parsed from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Substitutes metadata into every block and cleans up the result.
    ///
    /// With `allow_path_separators` false, `/` inside values is replaced by `_`
    /// so a value can never add a directory level.
    #[must_use]
    pub fn render(&self, metadata: &MetadataBag, allow_path_separators: bool) -> String {
        let mut substituted = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => substituted.push_str(text),
                Segment::Block(block) => {
                    substituted.push_str(&block.render(metadata, allow_path_separators));
                }
            }
        }
        clean_rendered(&substituted)
    }
}

impl fmt::Display for NamingTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for NamingTemplate {
    fn from(source: &str) -> Self {
        Self::parse(source)
    }
}

/// Parses and renders `template` in one step.
#[must_use]
pub fn render(template: &str, metadata: &MetadataBag, allow_path_separators: bool) -> String {
    if template.is_empty() {
        return String::new();
    }
    NamingTemplate::parse(template).render(metadata, allow_path_separators)
}

#[allow(clippy::expect_used)]
static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+").expect("slash run regex is valid"));
#[allow(clippy::expect_used)]
static LEADING_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\s\-_.]+").expect("leading separator regex is valid"));
#[allow(clippy::expect_used)]
static TRAILING_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-_.]+$").expect("trailing separator regex is valid"));
#[allow(clippy::expect_used)]
static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s*-\s*){2,}").expect("dash run regex is valid"));
#[allow(clippy::expect_used)]
static EMPTY_PARENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\)").expect("empty parens regex is valid"));
#[allow(clippy::expect_used)]
static EMPTY_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\]").expect("empty brackets regex is valid"));

/// Removes separators orphaned by blocks that rendered empty.
///
/// Runs of two or more dashes collapse to `" - "`, and empty `()`/`[]` pairs
/// are dropped in a single pass, so `(())` becomes `()`.
fn clean_rendered(rendered: &str) -> String {
    let collapsed = SLASH_RUN.replace_all(rendered, "/");
    let trimmed = collapsed.trim_matches('/');
    let trimmed = LEADING_SEPARATORS.replace(trimmed, "");
    let trimmed = TRAILING_SEPARATORS.replace(&trimmed, "");
    let dashes = DASH_RUN.replace_all(&trimmed, " - ");
    let parens = EMPTY_PARENS.replace_all(&dashes, "");
    let brackets = EMPTY_BRACKETS.replace_all(&parens, "");
    TRAILING_SEPARATORS.replace(&brackets, "").into_owned()
}
