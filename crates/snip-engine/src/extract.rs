//! Content extraction for located spans.
//!
//! Extraction is split in two so a builder can look at the content before
//! anything changes: [`extract`] returns detached copies of everything
//! between the markers plus a [`SpanEdit`], and the edit is only committed
//! once the builder has produced its widget (or decided to leave the span
//! alone).

use kuchiki::NodeRef;

use crate::dom::{self, TextMap, TextPoint};
use crate::error::EngineError;
use crate::locate::MarkerSpan;

/// Everything between an opener and its closer, as detached nodes.
#[derive(Debug, Default)]
pub struct ExtractedFragment {
    nodes: Vec<NodeRef>,
}

impl ExtractedFragment {
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<NodeRef> {
        self.nodes
    }

    pub fn is_blank(&self) -> bool {
        dom::is_blank(&self.nodes)
    }

    /// Serialized fragment.
    pub fn to_html(&self) -> String {
        dom::nodes_html(&self.nodes)
    }

    /// Move the fragment into `parent`.
    pub fn append_to(self, parent: &NodeRef) {
        for node in self.nodes {
            parent.append(node);
        }
    }
}

/// Pending side effects of an extraction.
///
/// The start element keeps whatever preceded the opener and the end element
/// keeps whatever followed the closer. A remnant that is blank takes its
/// element with it. Elements strictly between start and end are removed.
#[derive(Debug)]
pub struct SpanEdit {
    start: NodeRef,
    end: NodeRef,
    middle: Vec<NodeRef>,
    before: Vec<NodeRef>,
    after: Vec<NodeRef>,
}

impl SpanEdit {
    /// Apply the edit, inserting `widget` right after the start element (or
    /// in its place when the start element goes away).
    pub fn commit(self, widget: Option<&NodeRef>) {
        let Self {
            start,
            end,
            middle,
            before,
            after,
        } = self;
        let same_element = start == end;

        let mut anchor = start.clone();
        if let Some(widget) = widget {
            anchor.insert_after(widget.clone());
            anchor = widget.clone();
        }
        // A span inside one element leaves its tail in a copy of that element.
        let after = if same_element {
            if !dom::is_blank(&after) {
                let tail = dom::shallow_clone(&start);
                dom::remove_attr(&tail, "id");
                for node in after {
                    tail.append(node);
                }
                anchor.insert_after(tail);
            }
            None
        } else {
            Some(after)
        };

        for node in middle {
            node.detach();
        }
        keep_or_remove(&start, before);
        if let Some(after) = after {
            keep_or_remove(&end, after);
        }
    }
}

fn keep_or_remove(element: &NodeRef, remnant: Vec<NodeRef>) {
    if dom::is_blank(&remnant) {
        element.detach();
    } else {
        dom::replace_children(element, remnant);
    }
}

fn point(map: &TextMap, offset: usize, keyword: &'static str) -> Result<TextPoint, EngineError> {
    map.point(offset).ok_or_else(|| EngineError::MalformedSpan {
        keyword,
        message: format!("offset {offset} is outside the element text"),
    })
}

/// Extract the content of `span`.
///
/// `siblings` is the list the span was located in; it supplies the middle
/// elements.
pub fn extract(
    span: &MarkerSpan,
    siblings: &[NodeRef],
    keyword: &'static str,
) -> Result<(ExtractedFragment, SpanEdit), EngineError> {
    let start_map = TextMap::new(&span.start_element);
    let opener_start = point(&start_map, span.opener.start, keyword)?;
    let opener_end = point(&start_map, span.opener.end, keyword)?;

    let (end_map, nodes, middle) = if span.is_single_element() {
        let closer_start = point(&start_map, span.closer.start, keyword)?;
        let nodes = dom::slice(
            &span.start_element,
            Some(&opener_end),
            Some(&closer_start),
            true,
        );
        (start_map, nodes, Vec::new())
    } else {
        let end_map = TextMap::new(&span.end_element);
        let closer_start = point(&end_map, span.closer.start, keyword)?;

        let middle: Vec<NodeRef> = siblings
            .get(span.start + 1..span.end)
            .ok_or_else(|| EngineError::MalformedSpan {
                keyword,
                message: format!("span {}..{} exceeds sibling list", span.start, span.end),
            })?
            .to_vec();

        let mut nodes = dom::slice(&span.start_element, Some(&opener_end), None, true);
        nodes.extend(middle.iter().map(dom::deep_clone));
        nodes.extend(dom::slice(&span.end_element, None, Some(&closer_start), true));
        (end_map, nodes, middle)
    };
    let closer_end = point(&end_map, span.closer.end, keyword)?;

    let edit = SpanEdit {
        before: dom::slice(&span.start_element, None, Some(&opener_start), true),
        after: dom::slice(&span.end_element, Some(&closer_end), None, true),
        start: span.start_element.clone(),
        end: span.end_element.clone(),
        middle,
    };
    Ok((ExtractedFragment { nodes }, edit))
}
