//! Page module: metadata plus render operation.

use std::sync::Arc;

use docpage_meta::PageMetadata;

use crate::bundle::{BundleError, DEFAULT_ROOT_TAG, PageBundle, StaticContent};
use crate::content::{ContentNode, ContentTree, Element, StaticFragment};
use crate::mount::MountContext;

/// Something that turns a mount context into a content tree.
///
/// Implementations must be pure: equivalent contexts produce structurally
/// equal trees, and rendering never fails. Mount failures belong to the host.
pub trait Render: Send + Sync {
    fn render(&self, ctx: &MountContext) -> ContentTree;
}

/// Compiled documentation page.
///
/// Built once (by the build step or by decoding a [`PageBundle`]) and never
/// modified. A hot reload swaps in a whole new `PageModule`.
#[derive(Debug)]
pub struct PageModule {
    /// Metadata literal exactly as persisted.
    page_data: String,
    metadata: PageMetadata,
    root_tag: String,
    content: Arc<StaticFragment>,
}

impl PageModule {
    /// Create a module from built metadata and static content.
    #[must_use]
    pub fn new(metadata: PageMetadata, content: StaticFragment) -> Self {
        Self {
            page_data: metadata.to_literal(),
            metadata,
            root_tag: DEFAULT_ROOT_TAG.to_owned(),
            content: Arc::new(content),
        }
    }

    /// Decode a persisted bundle.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] if the metadata literal is invalid, the root tag
    /// is not a plain element name, or the static content is inconsistent.
    pub fn from_bundle(bundle: PageBundle) -> Result<Self, BundleError> {
        bundle.validate()?;
        let metadata = PageMetadata::from_literal(&bundle.page_data)?;
        Ok(Self {
            page_data: bundle.page_data,
            metadata,
            root_tag: bundle.root,
            content: Arc::new(StaticFragment::new(
                bundle.content.html,
                bundle.content.nodes,
            )),
        })
    }

    /// Decode a bundle from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Json`] for malformed JSON, otherwise as
    /// [`from_bundle`](Self::from_bundle).
    pub fn from_json(bytes: &[u8]) -> Result<Self, BundleError> {
        let bundle: PageBundle = serde_json::from_slice(bytes)?;
        Self::from_bundle(bundle)
    }

    /// Persisted form; the metadata literal is emitted unchanged.
    #[must_use]
    pub fn to_bundle(&self) -> PageBundle {
        PageBundle {
            page_data: self.page_data.clone(),
            root: self.root_tag.clone(),
            content: StaticContent {
                html: self.content.html().to_owned(),
                nodes: self.content.nodes(),
            },
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &PageMetadata {
        &self.metadata
    }

    /// Metadata literal as persisted in the bundle.
    #[must_use]
    pub fn page_data(&self) -> &str {
        &self.page_data
    }

    #[must_use]
    pub fn relative_path(&self) -> &str {
        self.metadata.relative_path()
    }

    /// Shared static subtree.
    #[must_use]
    pub fn content(&self) -> &Arc<StaticFragment> {
        &self.content
    }
}

impl Render for PageModule {
    fn render(&self, ctx: &MountContext) -> ContentTree {
        ContentTree::new(Element {
            tag: self.root_tag.clone(),
            key: ctx.key().cloned(),
            children: vec![ContentNode::Static(Arc::clone(&self.content))],
        })
    }
}

#[cfg(test)]
mod tests {
    use docpage_meta::PageMetadataBuilder;
    use pretty_assertions::assert_eq;
    use static_assertions::assert_impl_all;

    use super::*;
    use crate::mount::NodeId;

    assert_impl_all!(PageModule: Send, Sync);

    const HETU_LITERAL: &str = r#"{"title":"Hetu Script","description":"","frontmatter":{},"headers":[{"level":2,"title":"Warning","slug":"warning"},{"level":2,"title":"Introduction","slug":"introduction"}],"relativePath":"en-US/index.md","lastUpdated":1625730398918}"#;

    fn hetu_bundle() -> PageBundle {
        PageBundle {
            page_data: HETU_LITERAL.to_owned(),
            root: "div".to_owned(),
            content: StaticContent {
                html: r#"<h1 id="hetu-script">Hetu Script</h1><h2 id="warning">Warning</h2>"#
                    .to_owned(),
                nodes: 2,
            },
        }
    }

    #[test]
    fn test_render_single_root_wrapping_static() {
        let module = PageModule::from_bundle(hetu_bundle()).unwrap();
        let tree = module.render(&MountContext::new(NodeId(1)));

        assert_eq!(tree.root().tag, "div");
        assert_eq!(tree.root().children.len(), 1);
        let ContentNode::Static(fragment) = &tree.root().children[0] else {
            panic!("expected static child");
        };
        assert!(Arc::ptr_eq(fragment, module.content()));
        assert_eq!(fragment.nodes(), 2);
    }

    #[test]
    fn test_render_is_deterministic() {
        let module = PageModule::from_bundle(hetu_bundle()).unwrap();
        let a = module.render(&MountContext::new(NodeId(1)).with_key("page"));
        let b = module.render(&MountContext::new(NodeId(1)).with_key("page"));

        assert_eq!(a, b);
        assert!(a.shares_static_with(&b));
    }

    #[test]
    fn test_render_carries_key() {
        let module = PageModule::from_bundle(hetu_bundle()).unwrap();
        let tree = module.render(&MountContext::new(NodeId(3)).with_key("en-US/index.md"));
        assert_eq!(tree.root().key.as_ref().unwrap().as_str(), "en-US/index.md");
    }

    #[test]
    fn test_metadata_read_does_not_change_render() {
        let module = PageModule::from_bundle(hetu_bundle()).unwrap();
        let ctx = MountContext::new(NodeId(1));
        let before = module.render(&ctx);

        let toc: Vec<&str> = module
            .metadata()
            .toc_entries()
            .map(|h| h.slug.as_str())
            .collect();
        assert_eq!(toc, vec!["warning", "introduction"]);

        let after = module.render(&ctx);
        assert_eq!(before, after);
        assert!(before.shares_static_with(&after));
    }

    #[test]
    fn test_bundle_reemits_literal_verbatim() {
        // Key order and spacing differ from what serde would produce.
        let literal = r#"{"relativePath":"a.md", "title":"A"}"#;
        let bundle = PageBundle {
            page_data: literal.to_owned(),
            ..hetu_bundle()
        };
        let module = PageModule::from_bundle(bundle).unwrap();

        assert_eq!(module.page_data(), literal);
        assert_eq!(module.to_bundle().page_data, literal);
        assert_eq!(module.relative_path(), "a.md");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::to_vec(&hetu_bundle()).unwrap();
        let module = PageModule::from_json(&json).unwrap();
        assert_eq!(module.metadata().title(), "Hetu Script");
        assert_eq!(module.to_bundle(), hetu_bundle());
    }

    #[test]
    fn test_from_json_rejects_invalid_metadata() {
        let bundle = PageBundle {
            page_data: r#"{"title":"","relativePath":"a.md"}"#.to_owned(),
            ..hetu_bundle()
        };
        let result = PageModule::from_bundle(bundle);
        assert!(matches!(result, Err(BundleError::Metadata(_))));
    }

    #[test]
    fn test_new_from_builder() {
        let meta = PageMetadataBuilder::new("guide.md", "Guide")
            .with_heading(2, "Install")
            .build()
            .unwrap();
        let module = PageModule::new(meta, StaticFragment::new("<p>x</p>", 1));
        let reparsed = PageModule::from_bundle(module.to_bundle()).unwrap();
        assert_eq!(reparsed.metadata(), module.metadata());
    }
}
