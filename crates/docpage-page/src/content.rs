//! Content tree produced by rendering a page.
//!
//! The tree is deliberately small: one root [`Element`] whose children are
//! either further elements or [`StaticFragment`]s. A static fragment is
//! prebuilt HTML that the host inserts verbatim and never diffs; it is held by
//! `Arc` so every render of a page hands out the same allocation.

use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::mount::Key;

/// Precomputed HTML subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticFragment {
    html: String,
    nodes: usize,
}

impl StaticFragment {
    /// Create a fragment from HTML and its number of top-level nodes.
    #[must_use]
    pub fn new(html: impl Into<String>, nodes: usize) -> Self {
        Self {
            html: html.into(),
            nodes,
        }
    }

    #[must_use]
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Number of top-level nodes in the fragment.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }

    /// In-page link targets (`<a href="#slug">`) found in the fragment.
    ///
    /// These are the anchors a host binds scroll handlers to. Scanning stops
    /// at the first markup error.
    #[must_use]
    pub fn anchor_targets(&self) -> Vec<String> {
        let mut reader = Reader::from_str(&self.html);
        reader.config_mut().check_end_names = false;

        let mut targets = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e))
                    if e.name().as_ref().eq_ignore_ascii_case(b"a") =>
                {
                    for attr in e.html_attributes().flatten() {
                        if attr.key.as_ref().eq_ignore_ascii_case(b"href")
                            && let Some(slug) = attr.value.strip_prefix(b"#")
                            && !slug.is_empty()
                        {
                            targets.push(String::from_utf8_lossy(slug).into_owned());
                        }
                    }
                }
                Ok(Event::Eof) | Err(_) => break,
                Ok(_) => {}
            }
        }
        targets
    }
}

/// Element node with optional reconciliation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub key: Option<Key>,
    pub children: Vec<ContentNode>,
}

/// Node in a [`ContentTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentNode {
    Element(Element),
    Static(Arc<StaticFragment>),
}

/// Rendered output of a page: exactly one root element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentTree {
    root: Element,
}

impl ContentTree {
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Static fragments in document order.
    #[must_use]
    pub fn static_fragments(&self) -> Vec<&Arc<StaticFragment>> {
        let mut out = Vec::new();
        collect_static(&self.root, &mut out);
        out
    }

    /// Whether both trees reference the same static allocations.
    ///
    /// Hosts use this to skip re-committing a subtree they already inserted.
    #[must_use]
    pub fn shares_static_with(&self, other: &Self) -> bool {
        let ours = self.static_fragments();
        let theirs = other.static_fragments();
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(&theirs)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }

    /// Serialize the tree to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(&self.root, &mut out);
        out
    }
}

fn collect_static<'a>(element: &'a Element, out: &mut Vec<&'a Arc<StaticFragment>>) {
    for child in &element.children {
        match child {
            ContentNode::Element(el) => collect_static(el, out),
            ContentNode::Static(fragment) => out.push(fragment),
        }
    }
}

fn write_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    out.push('>');
    for child in &element.children {
        match child {
            ContentNode::Element(el) => write_element(el, out),
            ContentNode::Static(fragment) => out.push_str(fragment.html()),
        }
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tree_with(fragment: Arc<StaticFragment>) -> ContentTree {
        ContentTree::new(Element {
            tag: "div".to_owned(),
            key: None,
            children: vec![ContentNode::Static(fragment)],
        })
    }

    #[test]
    fn test_anchor_targets() {
        let fragment = StaticFragment::new(
            r##"<h2 id="warning"><a class="header-anchor" href="#warning">#</a> Warning</h2><a href="https://x.dev">x</a><a href="#quick-start">qs</a>"##,
            3,
        );
        assert_eq!(fragment.anchor_targets(), vec!["warning", "quick-start"]);
    }

    #[test]
    fn test_anchor_targets_ignores_bare_hash() {
        let fragment = StaticFragment::new(r##"<a href="#">top</a><a href="#x"##, 1);
        assert!(fragment.anchor_targets().is_empty());
    }

    #[test]
    fn test_anchor_targets_attribute_forms() {
        let fragment = StaticFragment::new(
            r##"<p>a<br>b</p><a href='#single'>1</a><a class="x" href = "#spaced">2</a><A HREF="#upper">3</A><link href="#not-a-link"/>"##,
            4,
        );
        assert_eq!(fragment.anchor_targets(), vec!["single", "spaced", "upper"]);
    }

    #[test]
    fn test_to_html_nests_static() {
        let tree = ContentTree::new(Element {
            tag: "div".to_owned(),
            key: None,
            children: vec![
                ContentNode::Element(Element {
                    tag: "section".to_owned(),
                    key: None,
                    children: vec![ContentNode::Static(Arc::new(StaticFragment::new(
                        "<p>a</p>", 1,
                    )))],
                }),
                ContentNode::Static(Arc::new(StaticFragment::new("<p>b</p>", 1))),
            ],
        });
        assert_eq!(
            tree.to_html(),
            "<div><section><p>a</p></section><p>b</p></div>"
        );
        assert_eq!(tree.static_fragments().len(), 2);
    }

    #[test]
    fn test_shares_static_by_pointer() {
        let shared = Arc::new(StaticFragment::new("<p>x</p>", 1));
        let a = tree_with(Arc::clone(&shared));
        let b = tree_with(Arc::clone(&shared));
        let copy = tree_with(Arc::new(StaticFragment::new("<p>x</p>", 1)));

        assert!(a.shares_static_with(&b));
        assert_eq!(a, copy);
        assert!(!a.shares_static_with(&copy));
    }
}
