//! Heading slug generation.

use std::collections::{HashMap, HashSet};

/// Slug used when a heading has no ASCII alphanumeric characters.
const FALLBACK_SLUG: &str = "section";

/// Convert text to URL-safe slug.
///
/// Converts to lowercase, replaces whitespace/dashes/underscores with single dashes,
/// and removes other non-alphanumeric characters.
///
/// ```
/// use docpage_meta::slugify;
///
/// assert_eq!(slugify("Quick start"), "quick-start");
/// assert_eq!(slugify("Apps that embedded Hetu:"), "apps-that-embedded-hetu");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Check whether a slug can be used verbatim as a URL fragment.
///
/// Only RFC 3986 unreserved characters are accepted.
#[must_use]
pub fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'))
}

/// Hands out slugs that are unique within one page.
///
/// Repeated headings get a numeric suffix: `faq`, `faq-1`, `faq-2`.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    counts: HashMap<String, usize>,
    used: HashSet<String>,
}

impl SlugAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a unique slug for a heading title.
    pub fn allocate(&mut self, title: &str) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            FALLBACK_SLUG.clone_into(&mut base);
        }

        let count = self.counts.entry(base.clone()).or_default();
        loop {
            let candidate = match *count {
                0 => base.clone(),
                n => format!("{base}-{n}"),
            };
            *count += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    /// Claim an explicit slug (e.g. a custom `{#anchor}`).
    ///
    /// Returns `false` if the slug is already taken on this page.
    pub fn reserve(&mut self, slug: &str) -> bool {
        self.used.insert(slug.to_owned())
    }
}
