//! Node-level helpers over `kuchiki` trees.
//!
//! Everything the builders do to the document goes through these helpers:
//! node construction, deep copies, serialization, class lists, inline
//! styles, and the text-point machinery in [`text`] and [`slice`] that lets
//! a marker be cut out of an element without re-parsing serialized markup.

mod slice;
mod style;
mod text;

use html5ever::{LocalName, Namespace, QualName};
use kuchiki::traits::{NodeIterator, TendrilSink};
use kuchiki::{Attribute, ExpandedName, NodeData, NodeRef, Selectors};

pub(crate) use slice::{delete_range, replace_range, slice, wrap_range};
pub(crate) use style::{set_style, style_property};
pub(crate) use text::{TextMap, TextPoint};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements that carry content even without text.
const EMBEDDED_TAGS: &[&str] = &[
    "audio", "canvas", "embed", "hr", "iframe", "img", "input", "math", "object", "picture",
    "svg", "video",
];

/// Root classes of the widgets the builders emit.
const WIDGET_CLASSES: &[&str] = &[
    "toggle",
    "reveal-answer",
    "content-grid",
    "quote-author",
    "tooltip-definitions",
    "tooltip-popover",
];

fn qual_name(tag: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag))
}

/// Create an HTML element with the given attributes.
pub(crate) fn element(tag: &str, attributes: &[(&str, &str)]) -> NodeRef {
    NodeRef::new_element(
        qual_name(tag),
        attributes.iter().map(|(name, value)| {
            (
                ExpandedName::new("", *name),
                Attribute {
                    prefix: None,
                    value: (*value).to_owned(),
                },
            )
        }),
    )
}

/// Create an element holding a single text node.
pub(crate) fn element_with_text(tag: &str, attributes: &[(&str, &str)], text: &str) -> NodeRef {
    let node = element(tag, attributes);
    node.append(NodeRef::new_text(text));
    node
}

/// Parse markup in the context of a `<div>` and return the detached nodes.
pub(crate) fn parse_fragment(html: &str) -> Vec<NodeRef> {
    let document = kuchiki::parse_fragment(qual_name("div"), Vec::new()).one(html);
    let Some(container) = document.first_child() else {
        return Vec::new();
    };
    let nodes: Vec<NodeRef> = container.children().collect();
    for node in &nodes {
        node.detach();
    }
    nodes
}

/// Copy a node without its children.
pub(crate) fn shallow_clone(node: &NodeRef) -> NodeRef {
    match node.data() {
        NodeData::Element(element) => NodeRef::new_element(
            element.name.clone(),
            element.attributes.borrow().map.clone(),
        ),
        NodeData::Text(text) => NodeRef::new_text(text.borrow().clone()),
        NodeData::Comment(comment) => NodeRef::new_comment(comment.borrow().clone()),
        NodeData::ProcessingInstruction(contents) => {
            let (target, data) = &*contents.borrow();
            NodeRef::new_processing_instruction(target.clone(), data.clone())
        }
        NodeData::Doctype(doctype) => NodeRef::new_doctype(
            doctype.name.clone(),
            doctype.public_id.clone(),
            doctype.system_id.clone(),
        ),
        NodeData::Document(_) => NodeRef::new_document(),
        NodeData::DocumentFragment => NodeRef::new(NodeData::DocumentFragment),
    }
}

/// Copy a node and its whole subtree, including `<template>` contents.
pub(crate) fn deep_clone(node: &NodeRef) -> NodeRef {
    let copy = shallow_clone(node);
    for child in node.children() {
        copy.append(deep_clone(&child));
    }
    if let (Some(source), Some(target)) = (node.as_element(), copy.as_element())
        && let (Some(from), Some(to)) = (&source.template_contents, &target.template_contents)
    {
        for child in from.children() {
            to.append(deep_clone(&child));
        }
    }
    copy
}

/// Serialized markup of the node's children.
pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|child| child.to_string()).collect()
}

/// Serialized markup of the node itself.
pub fn outer_html(node: &NodeRef) -> String {
    node.to_string()
}

/// Serialize a list of sibling nodes.
pub(crate) fn nodes_html(nodes: &[NodeRef]) -> String {
    nodes.iter().map(ToString::to_string).collect()
}

/// Local tag name of an element node.
pub(crate) fn tag_name(node: &NodeRef) -> Option<&str> {
    node.as_element().map(|element| &*element.name.local)
}

pub(crate) fn is_tag(node: &NodeRef, tag: &str) -> bool {
    tag_name(node) == Some(tag)
}

/// Element children only, skipping text and comments.
pub(crate) fn element_children(node: &NodeRef) -> Vec<NodeRef> {
    node.children().filter(|child| child.as_element().is_some()).collect()
}

pub(crate) fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()?
        .attributes
        .borrow()
        .get(name)
        .map(str::to_owned)
}

pub(crate) fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element
            .attributes
            .borrow_mut()
            .insert(name, value.to_owned());
    }
}

pub(crate) fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().remove(name);
    }
}

pub(crate) fn has_class(node: &NodeRef, class: &str) -> bool {
    attr(node, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

pub(crate) fn add_class(node: &NodeRef, class: &str) {
    if node.as_element().is_none() || has_class(node, class) {
        return;
    }
    let value = match attr(node, "class") {
        Some(existing) if !existing.trim().is_empty() => format!("{} {class}", existing.trim()),
        _ => class.to_owned(),
    };
    set_attr(node, "class", &value);
}

pub(crate) fn remove_class(node: &NodeRef, class: &str) {
    let Some(existing) = attr(node, "class") else {
        return;
    };
    let remaining: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
    if remaining.is_empty() {
        remove_attr(node, "class");
    } else {
        set_attr(node, "class", &remaining.join(" "));
    }
}

/// Whether the element is the root of a built widget.
pub(crate) fn is_widget(node: &NodeRef) -> bool {
    WIDGET_CLASSES.iter().any(|class| has_class(node, class))
}

/// Remove all children of a node.
pub(crate) fn clear_children(node: &NodeRef) {
    while let Some(child) = node.first_child() {
        child.detach();
    }
}

/// Replace the children of a node with the given nodes.
pub(crate) fn replace_children(node: &NodeRef, children: Vec<NodeRef>) {
    clear_children(node);
    for child in children {
        node.append(child);
    }
}

/// Whether a node belongs in a list of node handles (pointer identity).
pub(crate) fn contains_node(nodes: &[NodeRef], node: &NodeRef) -> bool {
    nodes.iter().any(|candidate| candidate == node)
}

/// Whether `node` is `ancestor` or lies inside it.
pub(crate) fn is_inclusive_descendant(node: &NodeRef, ancestor: &NodeRef) -> bool {
    node.inclusive_ancestors().any(|candidate| candidate == *ancestor)
}

/// Whether an element matches compiled selectors.
pub(crate) fn matches(selectors: &Selectors, node: &NodeRef) -> bool {
    node.clone()
        .into_element_ref()
        .is_some_and(|element| selectors.matches(&element))
}

/// Descendant elements (excluding `node`) matching the selectors, in document order.
pub(crate) fn select_all(node: &NodeRef, selectors: &Selectors) -> Vec<NodeRef> {
    node.descendants()
        .elements()
        .filter(|element| selectors.matches(element))
        .map(|element| element.as_node().clone())
        .collect()
}

/// First element in the subtree (including `node`) matching the selectors.
pub(crate) fn select_first(node: &NodeRef, selectors: &Selectors) -> Option<NodeRef> {
    node.inclusive_descendants()
        .elements()
        .find(|element| selectors.matches(element))
        .map(|element| element.as_node().clone())
}

/// Nearest element in `node`'s inclusive ancestry, stopping at `boundary`
/// (exclusive), that matches the selectors.
pub(crate) fn closest_within(
    node: &NodeRef,
    selectors: &Selectors,
    boundary: &NodeRef,
) -> Option<NodeRef> {
    node.inclusive_ancestors()
        .take_while(|ancestor| ancestor != boundary)
        .find(|ancestor| matches(selectors, ancestor))
}

/// Whether any inclusive ancestor below `boundary` is one of the tags.
pub(crate) fn inside_tag(node: &NodeRef, tags: &[&str], boundary: &NodeRef) -> bool {
    node.inclusive_ancestors()
        .take_while(|ancestor| ancestor != boundary)
        .any(|ancestor| tag_name(&ancestor).is_some_and(|tag| tags.contains(&tag)))
}

/// A node is blank when it shows nothing: whitespace-only text, comments,
/// and elements with neither visible text nor embedded content.
pub(crate) fn is_blank_node(node: &NodeRef) -> bool {
    match node.data() {
        NodeData::Text(text) => text.borrow().trim().is_empty(),
        NodeData::Element(_) => {
            node.text_contents().trim().is_empty()
                && !node
                    .inclusive_descendants()
                    .any(|n| tag_name(&n).is_some_and(|tag| EMBEDDED_TAGS.contains(&tag)))
        }
        _ => true,
    }
}

pub(crate) fn is_blank(nodes: &[NodeRef]) -> bool {
    nodes.iter().all(is_blank_node)
}

/// Topmost ancestor of `node`, or `node` itself when detached.
pub(crate) fn top(node: &NodeRef) -> NodeRef {
    node.inclusive_ancestors()
        .last()
        .unwrap_or_else(|| node.clone())
}

/// The `<body>` element of the document holding `node`, if any.
pub(crate) fn owning_body(node: &NodeRef) -> Option<NodeRef> {
    top(node)
        .inclusive_descendants()
        .find(|n| is_tag(n, "body"))
}

/// Text nodes under `node`, in document order.
pub(crate) fn text_nodes(node: &NodeRef) -> Vec<NodeRef> {
    node.descendants()
        .filter(|n| n.as_text().is_some())
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use kuchiki::NodeRef;
    use kuchiki::traits::TendrilSink;

    /// Parse a document and return its `<body>`.
    pub(crate) fn body(html: &str) -> NodeRef {
        let document = kuchiki::parse_html().one(html);
        document
            .select_first("body")
            .unwrap()
            .as_node()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::testing::body;
    use super::*;

    #[test]
    fn test_element_with_attributes() {
        let node = element("span", &[("class", "tooltip-ref"), ("tabindex", "0")]);
        node.append(NodeRef::new_text("x"));
        let html = outer_html(&node);
        assert!(html.starts_with("<span "));
        assert!(html.contains(r#"class="tooltip-ref""#));
        assert!(html.contains(r#"tabindex="0""#));
        assert!(html.ends_with(">x</span>"));
    }

    #[test]
    fn test_parse_fragment_keeps_order() {
        let nodes = parse_fragment("<p>a</p>text<b>b</b>");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes_html(&nodes), "<p>a</p>text<b>b</b>");
        assert!(nodes.iter().all(|n| n.parent().is_none()));
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let root = body("<body><p id=\"x\">Hello <b>world</b></p></body>");
        let original = root.first_child().unwrap();
        let copy = deep_clone(&original);
        assert_eq!(outer_html(&copy), outer_html(&original));

        clear_children(&copy);
        assert_eq!(inner_html(&original), "Hello <b>world</b>");
    }

    #[test]
    fn test_class_helpers() {
        let node = element("div", &[("class", "toggle")]);
        add_class(&node, "is-open");
        add_class(&node, "is-open");
        assert_eq!(attr(&node, "class").unwrap(), "toggle is-open");
        assert!(has_class(&node, "is-open"));

        remove_class(&node, "toggle");
        assert_eq!(attr(&node, "class").unwrap(), "is-open");
        remove_class(&node, "is-open");
        assert_eq!(attr(&node, "class"), None);
    }

    #[test]
    fn test_is_blank() {
        let root = body("<body><p> </p><p><img src=\"a.png\"></p><p><b> x </b></p><!-- c --></body>");
        let children: Vec<NodeRef> = root.children().collect();
        assert!(is_blank_node(&children[0]));
        assert!(!is_blank_node(&children[1]));
        assert!(!is_blank_node(&children[2]));
        assert!(is_blank_node(&children[3]));
    }
}
