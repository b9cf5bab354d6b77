//! `{{quote-author: Name}}` attributions attached to the preceding
//! blockquote.

use kuchiki::NodeRef;

use super::Builder;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, TextMap, element, element_with_text};
use crate::error::EngineError;
use crate::marker::{QUOTE_AUTHOR, clean_payload};
use crate::pipeline::Stage;
use crate::root::Scope;

fn previous_elements(node: &NodeRef) -> impl Iterator<Item = NodeRef> {
    node.preceding_siblings().filter(|n| n.as_element().is_some())
}

/// Nearest blockquote before `paragraph`: a previous sibling first, then a
/// previous sibling of the parent that is or contains one.
fn find_blockquote(paragraph: &NodeRef, root: &NodeRef) -> Option<NodeRef> {
    if let Some(quote) = previous_elements(paragraph).find(|n| dom::is_tag(n, "blockquote")) {
        return Some(quote);
    }
    let parent = paragraph.parent().filter(|parent| parent != root)?;
    previous_elements(&parent).find_map(|sibling| {
        if dom::is_tag(&sibling, "blockquote") {
            return Some(sibling);
        }
        sibling
            .descendants()
            .filter(|n| dom::is_tag(n, "blockquote"))
            .last()
    })
}

#[derive(Debug, Default)]
pub(crate) struct QuoteAuthorBuilder;

impl QuoteAuthorBuilder {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Handle the first marker in `paragraph`.
    ///
    /// Returns whether the paragraph is still in the tree, or `None` when it
    /// holds no marker.
    fn attribute(
        paragraph: &NodeRef,
        root: &NodeRef,
        diagnostics: &mut Diagnostics,
    ) -> Option<bool> {
        let map = TextMap::new(paragraph);
        let captures = QUOTE_AUTHOR.captures(map.text())?;
        let (whole, name) = (captures.get(0)?, captures.get(1)?);
        let (start, end) = (map.point(whole.start())?, map.point(whole.end())?);
        let name = clean_payload(name.as_str());

        let author = element("div", &[("class", "quote-author")]);
        author.append(element_with_text(
            "span",
            &[("class", "quote-author__text")],
            &name,
        ));

        let blockquote = find_blockquote(paragraph, root);
        dom::delete_range(paragraph, &start, &end);
        let keep_paragraph = !dom::is_blank_node(paragraph);

        match blockquote {
            Some(quote) => {
                dom::add_class(&quote, "has-author");
                dom::add_class(&author, "quote-author--attached");
                if dom::has_class(&quote, "kg-blockquote-alt") {
                    dom::add_class(&author, "quote-author--centered");
                }
                let mut anchor = quote;
                while let Some(next) = anchor.following_siblings().find(|n| n.as_element().is_some())
                    && dom::has_class(&next, "quote-author")
                {
                    anchor = next;
                }
                anchor.insert_after(author);
                if !keep_paragraph {
                    paragraph.detach();
                }
            }
            None => {
                diagnostics.report(
                    Stage::QuoteAuthor,
                    DiagnosticKind::MissingBlockquote,
                    format!("{{{{quote-author: {name}}}}} has no blockquote before it"),
                );
                paragraph.insert_after(author);
                if !keep_paragraph {
                    paragraph.detach();
                }
            }
        }
        Some(keep_paragraph)
    }
}

impl Builder for QuoteAuthorBuilder {
    fn stage(&self) -> Stage {
        Stage::QuoteAuthor
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let paragraphs: Vec<NodeRef> = scope
            .root()
            .descendants()
            .filter(|node| dom::is_tag(node, "p") && !scope.is_excluded(node))
            .collect();

        let mut widgets = 0;
        for paragraph in paragraphs {
            while let Some(kept) = Self::attribute(&paragraph, scope.root(), diagnostics) {
                widgets += 1;
                if !kept {
                    break;
                }
            }
        }
        Ok(widgets)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::run;

    #[test]
    fn test_attaches_to_previous_blockquote() {
        let (html, widgets, diagnostics) = run(
            &mut QuoteAuthorBuilder::new(),
            "<blockquote>Quote</blockquote><p>{{quote-author: Ada Lovelace}}</p>",
        );
        assert_eq!(widgets, 1);
        assert!(diagnostics.is_empty());
        assert_eq!(
            html,
            r#"<blockquote class="has-author">Quote</blockquote><div class="quote-author quote-author--attached"><span class="quote-author__text">Ada Lovelace</span></div>"#
        );
    }

    #[test]
    fn test_centered_for_alt_blockquote_and_paragraph_kept() {
        let (html, _, _) = run(
            &mut QuoteAuthorBuilder::new(),
            r#"<blockquote class="kg-blockquote-alt">Q</blockquote><p>More text</p><p>{{quote-author: X}} tail</p>"#,
        );
        assert_eq!(
            html,
            concat!(
                r#"<blockquote class="kg-blockquote-alt has-author">Q</blockquote>"#,
                r#"<div class="quote-author quote-author--attached quote-author--centered"><span class="quote-author__text">X</span></div>"#,
                "<p>More text</p><p> tail</p>",
            )
        );
    }

    #[test]
    fn test_blockquote_in_parent_sibling() {
        let (html, _, diagnostics) = run(
            &mut QuoteAuthorBuilder::new(),
            "<div><blockquote>A</blockquote><blockquote>B</blockquote></div><div><p>{{quote-author: N}}</p></div>",
        );
        assert!(diagnostics.is_empty());
        assert!(html.contains(r#"<blockquote>A</blockquote><blockquote class="has-author">B</blockquote><div class="quote-author quote-author--attached">"#));
        assert!(html.ends_with("<div></div>"));
    }

    #[test]
    fn test_missing_blockquote_renders_in_place() {
        let (html, widgets, diagnostics) = run(
            &mut QuoteAuthorBuilder::new(),
            "<p>Intro</p><p>{{quote-author: Nobody}}</p>",
        );
        assert_eq!(widgets, 1);
        assert_eq!(diagnostics.count(DiagnosticKind::MissingBlockquote), 1);
        assert_eq!(
            html,
            r#"<p>Intro</p><div class="quote-author"><span class="quote-author__text">Nobody</span></div>"#
        );
    }
}
