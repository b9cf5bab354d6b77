//! Cutting element content at text points.
//!
//! A cut never re-parses markup: the element is deep-copied, the text node
//! at each point is truncated, and every sibling past the cut is detached on
//! the way up to the copy. Inline ancestors that end up empty are pruned, so
//! `<p><b>{{toggle: T}}</b>rest</p>` yields `rest` and not `<b></b>rest`.

use kuchiki::NodeRef;

use super::{TextPoint, contains_node, deep_clone, replace_children};

/// Copy of `container`'s children restricted to the content between `from`
/// and `to` (`None` meaning the start or end of the container).
///
/// With `trim`, whitespace touching a cut is dropped.
pub(crate) fn slice(
    container: &NodeRef,
    from: Option<&TextPoint>,
    to: Option<&TextPoint>,
    trim: bool,
) -> Vec<NodeRef> {
    let copy = deep_clone(container);
    let from_node = from.and_then(|point| counterpart(container, &copy, &point.node));
    let to_node = to.and_then(|point| counterpart(container, &copy, &point.node));

    if let (Some(point), Some(node)) = (to, &to_node) {
        edit_text(node, |text| {
            text.truncate(point.offset.min(text.len()));
            if trim {
                text.truncate(text.trim_end().len());
            }
        });
        detach_following(node, &copy);
    }
    if let (Some(point), Some(node)) = (from, &from_node) {
        edit_text(node, |text| {
            let offset = point.offset.min(text.len());
            text.replace_range(..offset, "");
            if trim {
                let start = text.len() - text.trim_start().len();
                text.replace_range(..start, "");
            }
        });
        detach_preceding(node, &copy);
    }
    for node in [to_node, from_node].into_iter().flatten() {
        prune_if_empty(&node, &copy);
    }

    let children: Vec<NodeRef> = copy.children().collect();
    for child in &children {
        child.detach();
    }
    children
}

/// Remove the text between two points, leaving everything else in place.
pub(crate) fn delete_range(container: &NodeRef, from: &TextPoint, to: &TextPoint) {
    replace_range(container, from, to, Vec::new());
}

/// Replace the text between two points with `replacement`.
///
/// When both points sit in one text node the node is split in place;
/// otherwise the nearest common ancestor is rebuilt from two slices.
pub(crate) fn replace_range(
    container: &NodeRef,
    from: &TextPoint,
    to: &TextPoint,
    replacement: Vec<NodeRef>,
) {
    if from.node == to.node {
        let Some(text) = from.node.as_text() else {
            return;
        };
        let value = text.borrow().clone();
        let before = &value[..from.offset];
        let after = &value[to.offset..];
        if !before.is_empty() {
            from.node.insert_before(NodeRef::new_text(before));
        }
        for node in replacement {
            from.node.insert_before(node);
        }
        if after.is_empty() {
            from.node.detach();
        } else {
            *text.borrow_mut() = after.to_owned();
        }
        return;
    }

    let Some(scope) = common_ancestor(&from.node, &to.node, container) else {
        return;
    };
    let mut children = slice(&scope, None, Some(from), false);
    children.extend(replacement);
    children.extend(slice(&scope, Some(to), None, false));
    replace_children(&scope, children);
}

/// Remove an opener range and a closer range and wrap what lies between
/// them in `wrapper`.
pub(crate) fn wrap_range(
    container: &NodeRef,
    opener: (&TextPoint, &TextPoint),
    closer: (&TextPoint, &TextPoint),
    wrapper: &NodeRef,
) {
    let (open_start, open_end) = opener;
    let (close_start, close_end) = closer;

    let single_node = open_start.node == close_end.node
        && open_end.node == open_start.node
        && close_start.node == open_start.node;
    if single_node {
        let Some(text) = open_start.node.as_text() else {
            return;
        };
        let value = text.borrow().clone();
        let before = &value[..open_start.offset];
        let inner = &value[open_end.offset..close_start.offset];
        let after = &value[close_end.offset..];

        if !before.is_empty() {
            open_start.node.insert_before(NodeRef::new_text(before));
        }
        if !inner.is_empty() {
            wrapper.append(NodeRef::new_text(inner));
        }
        open_start.node.insert_before(wrapper.clone());
        if after.is_empty() {
            open_start.node.detach();
        } else {
            *text.borrow_mut() = after.to_owned();
        }
        return;
    }

    let Some(scope) = common_ancestor(&open_start.node, &close_end.node, container) else {
        return;
    };
    for node in slice(&scope, Some(open_end), Some(close_start), false) {
        wrapper.append(node);
    }
    let mut children = slice(&scope, None, Some(open_start), false);
    children.push(wrapper.clone());
    children.extend(slice(&scope, Some(close_end), None, false));
    replace_children(&scope, children);
}

/// Child-index path from `ancestor` down to `node`.
fn path_to(ancestor: &NodeRef, node: &NodeRef) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut current = node.clone();
    while current != *ancestor {
        path.push(current.preceding_siblings().count());
        current = current.parent()?;
    }
    path.reverse();
    Some(path)
}

/// The node in `copy` at the same position `node` has in `original`.
fn counterpart(original: &NodeRef, copy: &NodeRef, node: &NodeRef) -> Option<NodeRef> {
    let path = path_to(original, node)?;
    path.iter()
        .try_fold(copy.clone(), |current, &index| current.children().nth(index))
}

fn edit_text(node: &NodeRef, edit: impl FnOnce(&mut String)) {
    if let Some(text) = node.as_text() {
        edit(&mut text.borrow_mut());
    }
}

fn detach_following(node: &NodeRef, stop: &NodeRef) {
    let mut current = node.clone();
    while current != *stop {
        while let Some(next) = current.next_sibling() {
            next.detach();
        }
        let Some(parent) = current.parent() else {
            break;
        };
        current = parent;
    }
}

fn detach_preceding(node: &NodeRef, stop: &NodeRef) {
    let mut current = node.clone();
    while current != *stop {
        while let Some(previous) = current.previous_sibling() {
            previous.detach();
        }
        let Some(parent) = current.parent() else {
            break;
        };
        current = parent;
    }
}

/// Detach an emptied text node and any ancestors it leaves empty.
fn prune_if_empty(node: &NodeRef, stop: &NodeRef) {
    let mut current = node.clone();
    while current != *stop {
        let empty = match current.as_text() {
            Some(text) => text.borrow().is_empty(),
            None => current.as_element().is_some() && current.first_child().is_none(),
        };
        if !empty {
            break;
        }
        let parent = current.parent();
        current.detach();
        let Some(parent) = parent else {
            break;
        };
        current = parent;
    }
}

/// Nearest common ancestor of two nodes, no higher than `boundary`.
fn common_ancestor(a: &NodeRef, b: &NodeRef, boundary: &NodeRef) -> Option<NodeRef> {
    let mut chain = Vec::new();
    for ancestor in b.ancestors() {
        let last = ancestor == *boundary;
        chain.push(ancestor);
        if last {
            break;
        }
    }
    a.ancestors().find(|ancestor| contains_node(&chain, ancestor))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::testing::body;
    use crate::dom::{TextMap, element, inner_html, nodes_html};

    fn points(container: &NodeRef, needle: &str) -> (TextPoint, TextPoint) {
        let map = TextMap::new(container);
        let start = map.text().find(needle).unwrap();
        (
            map.point(start).unwrap(),
            map.point(start + needle.len()).unwrap(),
        )
    }

    #[test]
    fn test_slice_after_and_before_marker() {
        let root = body("<body><p>Intro {{t: A}} body <b>bold</b> tail</p></body>");
        let p = root.first_child().unwrap();
        let (start, end) = points(&p, "{{t: A}}");

        let after = slice(&p, Some(&end), None, true);
        assert_eq!(nodes_html(&after), "body <b>bold</b> tail");

        let before = slice(&p, None, Some(&start), true);
        assert_eq!(nodes_html(&before), "Intro");

        // The source is untouched
        assert_eq!(inner_html(&p), "Intro {{t: A}} body <b>bold</b> tail");
    }

    #[test]
    fn test_slice_prunes_emptied_inline_elements() {
        let root = body("<body><p><b>{{t: A}}</b> rest <i>x</i></p></body>");
        let p = root.first_child().unwrap();
        let (_, end) = points(&p, "{{t: A}}");
        // Trimming stops at the emptied text node; the next one keeps its space.
        assert_eq!(nodes_html(&slice(&p, Some(&end), None, true)), " rest <i>x</i>");
    }

    #[test]
    fn test_slice_between_two_points_in_nested_markup() {
        let root = body("<body><p>{{t: A}}<a href=\"/x\">link <em>deep</em> text</a>{{/t}}</p></body>");
        let p = root.first_child().unwrap();
        let (_, open_end) = points(&p, "{{t: A}}");
        let (close_start, _) = points(&p, "{{/t}}");
        assert_eq!(
            nodes_html(&slice(&p, Some(&open_end), Some(&close_start), true)),
            r#"<a href="/x">link <em>deep</em> text</a>"#
        );
    }

    #[test]
    fn test_slice_marker_split_across_nodes() {
        let root = body("<body><p>a {{t: <b>A}}</b>b</p></body>");
        let p = root.first_child().unwrap();
        let (_, end) = points(&p, "{{t: A}}");
        assert_eq!(nodes_html(&slice(&p, Some(&end), None, true)), "b");
    }

    #[test]
    fn test_delete_range_in_single_node() {
        let root = body("<body><p>x {{correct: y}} z</p></body>");
        let p = root.first_child().unwrap();
        let (start, end) = points(&p, "{{correct: y}}");
        delete_range(&p, &start, &end);
        assert_eq!(inner_html(&p), "x  z");
    }

    #[test]
    fn test_replace_range_splits_text_node() {
        let root = body("<body><p>see {{ref: k}} here</p></body>");
        let p = root.first_child().unwrap();
        let (start, end) = points(&p, "{{ref: k}}");
        replace_range(&p, &start, &end, vec![element("span", &[])]);
        assert_eq!(inner_html(&p), "see <span></span> here");
    }

    #[test]
    fn test_wrap_range_single_node() {
        let root = body("<body><p>Hello {{c}}world{{/c}} again</p></body>");
        let p = root.first_child().unwrap();
        let opener = points(&p, "{{c}}");
        let closer = points(&p, "{{/c}}");
        let span = element("span", &[]);
        wrap_range(&p, (&opener.0, &opener.1), (&closer.0, &closer.1), &span);
        assert_eq!(inner_html(&p), "Hello <span>world</span> again");
    }

    #[test]
    fn test_wrap_range_across_nodes() {
        let root = body("<body><p>x {{c}}a<b>b</b>{{/c}} y</p></body>");
        let p = root.first_child().unwrap();
        let opener = points(&p, "{{c}}");
        let closer = points(&p, "{{/c}}");
        let span = element("span", &[]);
        wrap_range(&p, (&opener.0, &opener.1), (&closer.0, &closer.1), &span);
        assert_eq!(inner_html(&p), "x <span>a<b>b</b></span> y");
    }
}
