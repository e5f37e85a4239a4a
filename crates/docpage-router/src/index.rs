//! Site-wide index built from page metadata.
//!
//! [`SiteIndex`] only reads metadata, never renders. It provides the sitemap,
//! per-page table of contents lookup and detection of pages whose relative
//! paths collide once mapped to module keys.

use std::collections::BTreeMap;
use std::sync::Arc;

use docpage_meta::Header;
use docpage_page::PageModule;
use docpage_source::module_key;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use serde::Serialize;

use crate::registry::{LoadError, ModuleRegistry};
use crate::resolve::RouteResolver;

/// XML namespace for sitemap.
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Milliseconds per day.
const MS_PER_DAY: u64 = 86_400_000;

/// Error writing the sitemap.
#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("Failed to write sitemap XML: {0}")]
    Write(#[from] std::io::Error),
    #[error("Sitemap XML is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One page in the site index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub relative_path: String,
    pub title: String,
    pub description: String,
    /// Milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<u64>,
}

impl SitemapEntry {
    /// Last update as `YYYY-MM-DD` (UTC).
    #[must_use]
    pub fn lastmod(&self) -> Option<String> {
        let days = i64::try_from(self.last_updated? / MS_PER_DAY).ok()?;
        let (year, month, day) = days_to_ymd(days);
        Some(format!("{year:04}-{month:02}-{day:02}"))
    }
}

/// Pages whose relative paths map to the same module key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub key: String,
    pub relative_paths: Vec<String>,
}

/// Index of all pages of a built site.
#[derive(Debug, Default)]
pub struct SiteIndex {
    entries: Vec<SitemapEntry>,
    modules: BTreeMap<String, Arc<PageModule>>,
    collisions: Vec<Collision>,
}

impl SiteIndex {
    /// Build an index from loaded modules.
    ///
    /// A relative path given twice keeps its first module.
    pub fn from_modules(
        modules: impl IntoIterator<Item = Arc<PageModule>>,
        resolver: &RouteResolver,
    ) -> Self {
        let mut by_path: BTreeMap<String, Arc<PageModule>> = BTreeMap::new();
        for module in modules {
            by_path
                .entry(module.relative_path().to_owned())
                .or_insert(module);
        }

        let mut by_key: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in by_path.keys() {
            by_key.entry(module_key(path)).or_default().push(path.clone());
        }
        let collisions: Vec<Collision> = by_key
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(key, relative_paths)| Collision {
                key,
                relative_paths,
            })
            .collect();
        for collision in &collisions {
            tracing::warn!(
                key = %collision.key,
                paths = ?collision.relative_paths,
                "Relative paths collide on module key"
            );
        }

        let mut entries: Vec<SitemapEntry> = by_path
            .values()
            .map(|module| {
                let meta = module.metadata();
                SitemapEntry {
                    url: resolver.to_url(meta.relative_path()),
                    relative_path: meta.relative_path().to_owned(),
                    title: meta.title().to_owned(),
                    description: meta.description().to_owned(),
                    last_updated: meta.last_updated(),
                }
            })
            .collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));

        Self {
            entries,
            modules: by_path,
            collisions,
        }
    }

    /// Load every page from the registry and index it.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the build manifest cannot be read.
    pub async fn scan(
        registry: &ModuleRegistry,
        resolver: &RouteResolver,
    ) -> Result<Self, LoadError> {
        let modules = registry.scan().await?;
        Ok(Self::from_modules(modules, resolver))
    }

    /// Drop a page from the sitemap entries. Its TOC stays available.
    #[must_use]
    pub fn without_page(mut self, relative_path: &str) -> Self {
        self.entries.retain(|e| e.relative_path != relative_path);
        self
    }

    /// Entries sorted by URL.
    #[must_use]
    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[must_use]
    pub fn module(&self, relative_path: &str) -> Option<&Arc<PageModule>> {
        self.modules.get(relative_path)
    }

    /// Table of contents of a page, in document order.
    #[must_use]
    pub fn toc(&self, relative_path: &str) -> Option<&[Header]> {
        Some(self.modules.get(relative_path)?.metadata().headers())
    }

    #[must_use]
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Render `sitemap.xml` with absolute URLs under `hostname`.
    ///
    /// # Errors
    ///
    /// Returns [`SitemapError`] if writing the XML fails.
    pub fn sitemap_xml(&self, hostname: &str) -> Result<String, SitemapError> {
        let host = hostname.trim_end_matches('/');
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer
            .create_element("urlset")
            .with_attribute(("xmlns", SITEMAP_NS))
            .write_inner_content(|w| -> std::io::Result<()> {
                for entry in &self.entries {
                    write_url(w, host, entry)?;
                }
                Ok(())
            })?;

        let mut xml = String::from_utf8(writer.into_inner())?;
        xml.push('\n');
        Ok(xml)
    }
}

fn write_url<W: std::io::Write>(
    writer: &mut Writer<W>,
    host: &str,
    entry: &SitemapEntry,
) -> std::io::Result<()> {
    writer
        .create_element("url")
        .write_inner_content(|w| -> std::io::Result<()> {
            let loc = format!("{host}{}", entry.url);
            w.create_element("loc")
                .write_text_content(BytesText::new(&loc))?;
            if let Some(lastmod) = entry.lastmod() {
                w.create_element("lastmod")
                    .write_text_content(BytesText::new(&lastmod))?;
            }
            Ok(())
        })?;
    Ok(())
}

/// Convert days since the Unix epoch to a civil `(year, month, day)`.
///
/// Howard Hinnant's `civil_from_days`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn days_to_ymd(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}
