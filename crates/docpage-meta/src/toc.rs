//! Nested table of contents.

use serde::Serialize;

use crate::metadata::Header;

/// One heading with the headings nested under it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocNode {
    pub header: Header,
    pub children: Vec<TocNode>,
}

/// Nest headers by level, keeping document order.
///
/// A header becomes a child of the closest preceding header with a lower
/// level. Headers deeper than `max_level` are dropped.
pub(crate) fn build_toc_tree(headers: &[Header], max_level: u8) -> Vec<TocNode> {
    let included: Vec<&Header> = headers.iter().filter(|h| h.level <= max_level).collect();
    let mut pos = 0;
    nest(&included, &mut pos, 0)
}

fn nest(headers: &[&Header], pos: &mut usize, parent_level: u8) -> Vec<TocNode> {
    let mut nodes = Vec::new();
    while let Some(header) = headers.get(*pos) {
        if header.level <= parent_level {
            break;
        }
        *pos += 1;
        let children = nest(headers, pos, header.level);
        nodes.push(TocNode {
            header: (*header).clone(),
            children,
        });
    }
    nodes
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn h(level: u8, slug: &str) -> Header {
        Header::new(level, slug.to_uppercase(), slug)
    }

    fn slugs(nodes: &[TocNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.header.slug.as_str()).collect()
    }

    #[test]
    fn test_flat_siblings() {
        let tree = build_toc_tree(&[h(2, "warning"), h(2, "introduction")], 6);
        assert_eq!(slugs(&tree), vec!["warning", "introduction"]);
        assert!(tree.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn test_nested_children() {
        let headers = [h(2, "a"), h(3, "a1"), h(3, "a2"), h(2, "b"), h(3, "b1")];
        let tree = build_toc_tree(&headers, 6);
        assert_eq!(slugs(&tree), vec!["a", "b"]);
        assert_eq!(slugs(&tree[0].children), vec!["a1", "a2"]);
        assert_eq!(slugs(&tree[1].children), vec!["b1"]);
    }

    #[test]
    fn test_level_jump_nests_under_nearest() {
        let headers = [h(2, "a"), h(4, "deep"), h(3, "mid")];
        let tree = build_toc_tree(&headers, 6);
        assert_eq!(slugs(&tree), vec!["a"]);
        assert_eq!(slugs(&tree[0].children), vec!["deep", "mid"]);
    }

    #[test]
    fn test_max_level_filters() {
        let headers = [h(2, "a"), h(3, "a1"), h(2, "b")];
        let tree = build_toc_tree(&headers, 2);
        assert_eq!(slugs(&tree), vec!["a", "b"]);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(build_toc_tree(&[], 6).is_empty());
    }
}
