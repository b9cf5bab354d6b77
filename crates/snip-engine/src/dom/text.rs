//! Mapping between an element's text content and its text nodes.

use kuchiki::NodeRef;

/// A position inside a text node: byte `offset` into the node's string.
#[derive(Debug, Clone)]
pub(crate) struct TextPoint {
    pub node: NodeRef,
    pub offset: usize,
}

/// The concatenated text of an element with the start offset of every text
/// node that contributes to it.
///
/// Offsets found by running a regex over [`TextMap::text`] translate back to
/// [`TextPoint`]s with [`TextMap::point`], which is how a marker that an
/// editor split over several text nodes (`{{tog<b></b>gle: A}}`) is still
/// cut out precisely.
pub(crate) struct TextMap {
    text: String,
    nodes: Vec<(NodeRef, usize)>,
}

impl TextMap {
    /// Build the map for `container`. Matches `NodeRef::text_contents` order.
    pub(crate) fn new(container: &NodeRef) -> Self {
        let mut text = String::new();
        let mut nodes = Vec::new();
        for node in container.inclusive_descendants() {
            if let Some(contents) = node.as_text() {
                nodes.push((node.clone(), text.len()));
                text.push_str(&contents.borrow());
            }
        }
        Self { text, nodes }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Translate a byte offset in [`Self::text`] into a point.
    ///
    /// An offset on the boundary between two nodes resolves to the end of
    /// the earlier node.
    pub(crate) fn point(&self, offset: usize) -> Option<TextPoint> {
        self.nodes.iter().find_map(|(node, start)| {
            let len = node.as_text().map_or(0, |t| t.borrow().len());
            (*start <= offset && offset <= start + len).then(|| TextPoint {
                node: node.clone(),
                offset: offset - start,
            })
        })
    }

    /// Text node holding the byte at `offset` (not a boundary position).
    pub(crate) fn node_at(&self, offset: usize) -> Option<NodeRef> {
        self.nodes.iter().find_map(|(node, start)| {
            let len = node.as_text().map_or(0, |t| t.borrow().len());
            (*start <= offset && offset < start + len).then(|| node.clone())
        })
    }
}
