//! Persisted form of a compiled page module.
//!
//! The build writes one JSON bundle per page:
//!
//! ```json
//! {
//!   "pageData": "{\"title\":\"Hetu Script\",...}",
//!   "root": "div",
//!   "static": { "html": "<h1 id=\"hetu-script\">...</h1>...", "nodes": 35 }
//! }
//! ```
//!
//! `pageData` is the metadata literal as a string. The runtime parses it but
//! keeps the original text so that rebuilding a bundle from a loaded module
//! reproduces it byte for byte.

use docpage_meta::MetadataError;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_ROOT_TAG: &str = "div";

/// Compiled page module as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBundle {
    /// Serialized page metadata literal.
    pub page_data: String,
    /// Tag of the root element wrapping the static content.
    #[serde(default = "default_root")]
    pub root: String,
    /// Precomputed static content.
    #[serde(rename = "static")]
    pub content: StaticContent,
}

/// Static HTML emitted by the content compiler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticContent {
    pub html: String,
    /// Number of top-level nodes in `html`.
    pub nodes: usize,
}

fn default_root() -> String {
    DEFAULT_ROOT_TAG.to_owned()
}

/// Error decoding a [`PageBundle`].
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Bundle is not valid JSON or misses required fields.
    #[error("Invalid bundle JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Metadata literal failed to parse or validate.
    #[error("Invalid page data: {0}")]
    Metadata(#[from] MetadataError),
    /// Root tag is not a plain element name.
    #[error("Invalid root tag '{0}'")]
    InvalidRootTag(String),
    /// Node count disagrees with the HTML.
    #[error("Static content has {nodes} nodes but {len} bytes of HTML")]
    NodeCount {
        /// Declared node count.
        nodes: usize,
        /// HTML length in bytes.
        len: usize,
    },
}

impl PageBundle {
    /// Check structural consistency that the metadata parser does not cover.
    pub(crate) fn validate(&self) -> Result<(), BundleError> {
        let tag_ok = self
            .root
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .root
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !tag_ok {
            return Err(BundleError::InvalidRootTag(self.root.clone()));
        }

        let html_empty = self.content.html.is_empty();
        if html_empty != (self.content.nodes == 0) {
            return Err(BundleError::NodeCount {
                nodes: self.content.nodes,
                len: self.content.html.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(root: &str, html: &str, nodes: usize) -> PageBundle {
        PageBundle {
            page_data: r#"{"title":"A","relativePath":"a.md"}"#.to_owned(),
            root: root.to_owned(),
            content: StaticContent {
                html: html.to_owned(),
                nodes,
            },
        }
    }

    #[test]
    fn test_parse_json_field_names() {
        let json = r#"{"pageData":"{}","root":"main","static":{"html":"<p>x</p>","nodes":1}}"#;
        let bundle: PageBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.page_data, "{}");
        assert_eq!(bundle.root, "main");
        assert_eq!(bundle.content.nodes, 1);
    }

    #[test]
    fn test_root_defaults_to_div() {
        let json = r#"{"pageData":"{}","static":{"html":"","nodes":0}}"#;
        let bundle: PageBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.root, "div");
    }

    #[test]
    fn test_missing_static_is_error() {
        let result: Result<PageBundle, _> = serde_json::from_str(r#"{"pageData":"{}"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_root_tag() {
        assert!(bundle("div", "<p/>", 1).validate().is_ok());
        assert!(bundle("custom-el", "<p/>", 1).validate().is_ok());
        assert!(matches!(
            bundle("", "<p/>", 1).validate(),
            Err(BundleError::InvalidRootTag(_))
        ));
        assert!(matches!(
            bundle("div onclick=x", "<p/>", 1).validate(),
            Err(BundleError::InvalidRootTag(_))
        ));
        assert!(matches!(
            bundle("1div", "<p/>", 1).validate(),
            Err(BundleError::InvalidRootTag(_))
        ));
    }

    #[test]
    fn test_validate_node_count() {
        assert!(bundle("div", "", 0).validate().is_ok());
        assert!(matches!(
            bundle("div", "<p>x</p>", 0).validate(),
            Err(BundleError::NodeCount { nodes: 0, len: 8 })
        ));
        assert!(matches!(
            bundle("div", "", 3).validate(),
            Err(BundleError::NodeCount { nodes: 3, len: 0 })
        ));
    }
}
