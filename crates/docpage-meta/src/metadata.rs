//! Immutable page metadata.
//!
//! [`PageMetadata`] is produced once per page by the build and persisted as a
//! JSON literal inside the compiled page module. At runtime it is only read:
//! there is no setter, and a rebuild replaces the whole value.
//!
//! Every constructed value upholds:
//! - `title` is non-empty
//! - `relative_path` is non-empty
//! - header levels are in `1..=6`
//! - header slugs are URL-safe and unique within the page

use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::frontmatter::Frontmatter;
use crate::slug::is_url_safe;
use crate::toc::{TocNode, build_toc_tree};

/// Table of contents heading derived from the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor slug, unique within the page.
    pub slug: String,
}

impl Header {
    #[must_use]
    pub fn new(level: u8, title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            slug: slug.into(),
        }
    }

    /// Fragment link to this heading (`#slug`).
    #[must_use]
    pub fn anchor(&self) -> String {
        format!("#{}", self.slug)
    }
}

/// Description of one documentation page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPageMetadata")]
pub struct PageMetadata {
    title: String,
    description: String,
    frontmatter: Frontmatter,
    headers: Vec<Header>,
    relative_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<u64>,
}

/// Unvalidated wire form of [`PageMetadata`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPageMetadata {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) frontmatter: Frontmatter,
    #[serde(default)]
    pub(crate) headers: Vec<Header>,
    pub(crate) relative_path: String,
    #[serde(default)]
    pub(crate) last_updated: Option<u64>,
}

/// Error type for metadata operations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// Literal is not valid page data JSON.
    #[error("{0}")]
    Parse(String),
    /// Title is empty or whitespace.
    #[error("Page title cannot be empty")]
    EmptyTitle,
    /// Relative path is empty.
    #[error("Page relative path cannot be empty")]
    EmptyRelativePath,
    /// Heading level outside 1-6.
    #[error("Header '{slug}' has invalid level {level} (expected 1-6)")]
    InvalidLevel {
        /// Slug of the offending header.
        slug: String,
        /// Level found in the data.
        level: u8,
    },
    /// Slug is empty or contains characters not allowed in a URL fragment.
    #[error("Header slug '{0}' is not URL-safe")]
    InvalidSlug(String),
    /// Two headers share a slug.
    #[error("Duplicate header slug '{0}'")]
    DuplicateSlug(String),
}

impl TryFrom<RawPageMetadata> for PageMetadata {
    type Error = MetadataError;

    fn try_from(raw: RawPageMetadata) -> Result<Self, Self::Error> {
        validate(&raw)?;
        Ok(Self {
            title: raw.title,
            description: raw.description,
            frontmatter: raw.frontmatter,
            headers: raw.headers,
            relative_path: raw.relative_path,
            last_updated: raw.last_updated,
        })
    }
}

fn validate(raw: &RawPageMetadata) -> Result<(), MetadataError> {
    if raw.title.trim().is_empty() {
        return Err(MetadataError::EmptyTitle);
    }
    if raw.relative_path.is_empty() {
        return Err(MetadataError::EmptyRelativePath);
    }

    let mut seen = HashSet::with_capacity(raw.headers.len());
    for header in &raw.headers {
        if !(1..=6).contains(&header.level) {
            return Err(MetadataError::InvalidLevel {
                slug: header.slug.clone(),
                level: header.level,
            });
        }
        if !is_url_safe(&header.slug) {
            return Err(MetadataError::InvalidSlug(header.slug.clone()));
        }
        if !seen.insert(header.slug.as_str()) {
            return Err(MetadataError::DuplicateSlug(header.slug.clone()));
        }
    }

    Ok(())
}

impl PageMetadata {
    /// Parse the persisted page data literal.
    ///
    /// Missing `description`, `frontmatter` and `headers` default to empty;
    /// a missing `lastUpdated` means the timestamp is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::Parse`] for malformed JSON and the specific
    /// validation error for data that breaks a metadata invariant.
    pub fn from_literal(literal: &str) -> Result<Self, MetadataError> {
        let raw: RawPageMetadata = serde_json::from_str(literal)
            .map_err(|e| MetadataError::Parse(format!("Invalid page data: {e}")))?;
        Self::try_from(raw)
    }

    /// Serialize to the page data literal.
    ///
    /// Fields are emitted in literal order and frontmatter keys in the order
    /// they were parsed or inserted, so a parsed literal in compact form is
    /// reproduced byte for byte.
    #[must_use]
    pub fn to_literal(&self) -> String {
        // Only string keys and JSON values: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub(crate) fn from_raw(raw: RawPageMetadata) -> Result<Self, MetadataError> {
        Self::try_from(raw)
    }

    /// Human-readable page title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Page description, possibly empty.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Author-supplied frontmatter.
    #[must_use]
    pub fn frontmatter(&self) -> &Frontmatter {
        &self.frontmatter
    }

    /// Headers in document order.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Source-relative path, e.g. `en-US/index.md`.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Last modification as epoch milliseconds, `None` if unknown.
    #[must_use]
    pub fn last_updated(&self) -> Option<u64> {
        self.last_updated
    }

    /// Last modification as a [`SystemTime`].
    #[must_use]
    pub fn last_updated_time(&self) -> Option<SystemTime> {
        self.last_updated.map(|ms| UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// Find a header by slug.
    #[must_use]
    pub fn header(&self, slug: &str) -> Option<&Header> {
        self.headers.iter().find(|h| h.slug == slug)
    }

    /// Flat table of contents in document order.
    pub fn toc_entries(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter()
    }

    /// Nested table of contents including headers up to `max_level`.
    #[must_use]
    pub fn toc_tree(&self, max_level: u8) -> Vec<TocNode> {
        build_toc_tree(&self.headers, max_level)
    }
}
