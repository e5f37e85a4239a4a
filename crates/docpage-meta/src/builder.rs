//! Build-time assembly of [`PageMetadata`].

use serde_json::Value;

use crate::frontmatter::Frontmatter;
use crate::metadata::{Header, MetadataError, PageMetadata, RawPageMetadata};
use crate::slug::SlugAllocator;

/// Builder used by the content compiler to produce [`PageMetadata`].
///
/// Headings are added in document order; slugs are derived from their titles
/// and deduplicated per page.
///
/// # Example
///
/// ```
/// use docpage_meta::PageMetadataBuilder;
///
/// let meta = PageMetadataBuilder::new("guide/faq.md", "FAQ")
///     .with_heading(2, "General")
///     .with_heading(2, "General")
///     .build()
///     .unwrap();
///
/// let slugs: Vec<_> = meta.headers().iter().map(|h| h.slug.as_str()).collect();
/// assert_eq!(slugs, ["general", "general-1"]);
/// ```
#[derive(Debug)]
pub struct PageMetadataBuilder {
    relative_path: String,
    title: String,
    description: String,
    frontmatter: Frontmatter,
    headers: Vec<Header>,
    slugs: SlugAllocator,
    duplicate_slug: Option<String>,
    last_updated: Option<u64>,
}

impl PageMetadataBuilder {
    /// Start metadata for the page at `relative_path`.
    #[must_use]
    pub fn new(relative_path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            title: title.into(),
            description: String::new(),
            frontmatter: Frontmatter::new(),
            headers: Vec::new(),
            slugs: SlugAllocator::new(),
            duplicate_slug: None,
            last_updated: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the whole frontmatter map.
    #[must_use]
    pub fn with_frontmatter(mut self, frontmatter: Frontmatter) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    /// Add a single frontmatter entry.
    #[must_use]
    pub fn with_frontmatter_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.frontmatter.insert(key, value);
        self
    }

    /// Add a heading, deriving its slug from the title.
    #[must_use]
    pub fn with_heading(mut self, level: u8, title: impl Into<String>) -> Self {
        let title = title.into();
        let slug = self.slugs.allocate(&title);
        self.headers.push(Header { level, title, slug });
        self
    }

    /// Add a heading with an explicit slug (custom anchor).
    #[must_use]
    pub fn with_heading_slug(
        mut self,
        level: u8,
        title: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        let slug = slug.into();
        if !self.slugs.reserve(&slug) && self.duplicate_slug.is_none() {
            self.duplicate_slug = Some(slug.clone());
        }
        self.headers.push(Header {
            level,
            title: title.into(),
            slug,
        });
        self
    }

    /// Set last modification time in epoch milliseconds.
    #[must_use]
    pub fn with_last_updated(mut self, epoch_ms: u64) -> Self {
        self.last_updated = Some(epoch_ms);
        self
    }

    /// Validate and produce the metadata.
    ///
    /// # Errors
    ///
    /// Returns a [`MetadataError`] if the title or path is empty, a heading
    /// level is outside 1-6, or an explicit slug is invalid or duplicated.
    pub fn build(self) -> Result<PageMetadata, MetadataError> {
        if let Some(slug) = self.duplicate_slug {
            return Err(MetadataError::DuplicateSlug(slug));
        }

        PageMetadata::from_raw(RawPageMetadata {
            title: self.title,
            description: self.description,
            frontmatter: self.frontmatter,
            headers: self.headers,
            relative_path: self.relative_path,
            last_updated: self.last_updated,
        })
    }
}
