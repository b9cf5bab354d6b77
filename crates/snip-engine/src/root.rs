//! Content root and its exclusion zones.

use kuchiki::{NodeRef, Selectors};

use crate::dom;

/// The container holding post body markup.
///
/// Every content stage is scoped to one root and never touches markup
/// outside it.
///
/// Parent links in the tree are weak, so the root also holds the top of its
/// document: ancestors stay reachable for as long as the root lives.
#[derive(Debug, Clone)]
pub struct ContentRoot {
    node: NodeRef,
    document: NodeRef,
}

impl ContentRoot {
    pub fn new(node: NodeRef) -> Self {
        let document = dom::top(&node);
        Self { node, document }
    }

    /// First element in `document` matching `selectors`.
    pub fn find(document: &NodeRef, selectors: &Selectors) -> Option<Self> {
        dom::select_first(document, selectors).map(Self::new)
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// Top of the tree the root lives in.
    pub fn document(&self) -> &NodeRef {
        &self.document
    }
}

/// A content root with the announcement-like containers inside it that
/// content stages must leave alone.
pub(crate) struct Scope {
    root: ContentRoot,
    excluded: Vec<NodeRef>,
}

impl Scope {
    pub(crate) fn new(root: &ContentRoot, exclude: &Selectors) -> Self {
        Self {
            root: root.clone(),
            excluded: dom::select_all(root.node(), exclude),
        }
    }

    pub(crate) fn root(&self) -> &NodeRef {
        self.root.node()
    }

    pub(crate) fn document(&self) -> &NodeRef {
        self.root.document()
    }

    /// Whether `node` lies inside an excluded container.
    pub(crate) fn is_excluded(&self, node: &NodeRef) -> bool {
        self.excluded
            .iter()
            .any(|zone| dom::is_inclusive_descendant(node, zone))
    }

    /// Current element children of `container`, minus excluded containers.
    ///
    /// Taken fresh on every call: builders mutate the sibling list.
    pub(crate) fn blocks_in(&self, container: &NodeRef) -> Vec<NodeRef> {
        dom::element_children(container)
            .into_iter()
            .filter(|child| !self.is_excluded(child))
            .collect()
    }

    /// Content regions of widgets already built inside the root, in
    /// document order. Block markers inside them are scanned per region.
    pub(crate) fn widget_regions(&self) -> Vec<NodeRef> {
        self.root()
            .descendants()
            .filter(is_widget_region)
            .filter(|node| !self.is_excluded(node))
            .collect()
    }
}

/// Whether a grid is an icon block (icon column followed by content).
fn is_icon_block(grid: &NodeRef) -> bool {
    dom::has_class(grid, "content-grid")
        && dom::element_children(grid)
            .first()
            .is_some_and(|icon| dom::element_children(icon).iter().any(|c| dom::is_tag(c, "svg")))
}

fn is_widget_region(node: &NodeRef) -> bool {
    if dom::has_class(node, "toggle__content") || dom::has_class(node, "reveal-answer__body") {
        return true;
    }
    if dom::has_class(node, "content-grid") {
        return !is_icon_block(node);
    }
    node.parent().is_some_and(|parent| {
        is_icon_block(&parent)
            && dom::element_children(&parent)
                .first()
                .is_some_and(|icon| icon != node)
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::testing::body;

    #[test]
    fn test_blocks_skip_excluded_containers() {
        let document = body(
            r#"<body><div class="gh-content"><p>a</p><div class="announcement-bar"><p>{{color}}x{{/color}}</p></div><p>b</p></div></body>"#,
        );
        let root_selector = Selectors::compile(".gh-content").unwrap();
        let exclude = Selectors::compile(r#".announcement-bar, [class*="announcement"]"#).unwrap();
        let root = ContentRoot::find(&document, &root_selector).unwrap();
        let scope = Scope::new(&root, &exclude);

        let texts: Vec<String> = scope.blocks_in(scope.root()).iter().map(NodeRef::text_contents).collect();
        assert_eq!(texts, vec!["a".to_owned(), "b".to_owned()]);

        let inner = dom::select_first(root.node(), &Selectors::compile(".announcement-bar p").unwrap())
            .unwrap();
        assert!(scope.is_excluded(&inner));
        assert!(scope.widget_regions().is_empty());
        assert!(!scope.is_excluded(scope.root()));
    }

    #[test]
    fn test_root_keeps_document_alive() {
        let root = {
            let document = body(r#"<body><main><div class="gh-content"><p>a</p></div></main></body>"#);
            ContentRoot::find(&document, &Selectors::compile(".gh-content").unwrap()).unwrap()
        };
        let main = root.node().parent().unwrap();
        assert!(dom::is_tag(&main, "main"));
        assert!(dom::owning_body(root.node()).is_some());
        assert!(root.document().parent().is_none());
    }
}
