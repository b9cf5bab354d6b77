//! Playing-card glyph colorizer.
//!
//! Every ♥ ♦ ♣ ♠ (and its emoji presentation with U+FE0F) becomes a colored
//! `span.card-symbol`, and the alphanumeric character right before it
//! (whitespace skipped) gets a matching `span.card-symbol-char`. The parent
//! of every rewritten text node is tagged `card-symbol-processed` so later
//! runs leave it alone.

use kuchiki::NodeRef;

use super::Builder;
use crate::diagnostics::Diagnostics;
use crate::dom::{self, element_with_text};
use crate::error::EngineError;
use crate::pipeline::Stage;
use crate::root::Scope;

pub(crate) const PROCESSED_CLASS: &str = "card-symbol-processed";

/// Glyphs in match order: emoji variants first so the selector is consumed
/// with its base glyph.
const GLYPHS: [(&str, &str); 8] = [
    ("\u{2660}\u{FE0F}", "black"),
    ("\u{2665}\u{FE0F}", "red"),
    ("\u{2666}\u{FE0F}", "blue"),
    ("\u{2663}\u{FE0F}", "green"),
    ("\u{2660}", "black"),
    ("\u{2665}", "red"),
    ("\u{2666}", "blue"),
    ("\u{2663}", "green"),
];

/// Color class for a card glyph.
pub fn card_color(glyph: &str) -> Option<&'static str> {
    GLYPHS
        .iter()
        .find(|(candidate, _)| *candidate == glyph)
        .map(|(_, color)| *color)
}

fn glyph_at(text: &str) -> Option<(&'static str, &'static str)> {
    GLYPHS
        .iter()
        .find(|(glyph, _)| text.starts_with(glyph))
        .copied()
}

fn has_glyph(text: &str) -> bool {
    GLYPHS.iter().any(|(glyph, _)| text.contains(glyph))
}

/// Split `text` into text nodes and symbol spans. Returns the nodes and the
/// number of symbols found.
fn colorize(text: &str) -> (Vec<NodeRef>, usize) {
    fn push_text(nodes: &mut Vec<NodeRef>, text: &str) {
        if !text.is_empty() {
            nodes.push(NodeRef::new_text(text));
        }
    }

    let mut nodes = Vec::new();
    let mut symbols = 0;
    let mut last = 0;
    let mut index = 0;
    while let Some(rest) = text.get(index..).filter(|rest| !rest.is_empty()) {
        let Some((glyph, color)) = glyph_at(rest) else {
            index += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };

        let before = &text[last..index];
        let trimmed = before.trim_end();
        match trimmed.chars().next_back() {
            Some(previous) if previous.is_alphanumeric() => {
                let char_start = last + trimmed.len() - previous.len_utf8();
                push_text(&mut nodes, &text[last..char_start]);
                nodes.push(element_with_text(
                    "span",
                    &[("class", &format!("card-symbol-char card-symbol-char--{color}"))],
                    &previous.to_string(),
                ));
                push_text(&mut nodes, &text[last + trimmed.len()..index]);
            }
            _ => push_text(&mut nodes, before),
        }
        nodes.push(element_with_text(
            "span",
            &[("class", &format!("card-symbol card-symbol--{color}"))],
            glyph,
        ));
        symbols += 1;
        index += glyph.len();
        last = index;
    }
    push_text(&mut nodes, &text[last..]);
    (nodes, symbols)
}

#[derive(Debug, Default)]
pub(crate) struct CardSymbolBuilder;

impl CardSymbolBuilder {
    pub(crate) fn new() -> Self {
        Self
    }

    /// Text nodes holding a glyph that are not under script/style or an
    /// already processed element.
    fn candidates(scope: &Scope) -> Vec<NodeRef> {
        let root = scope.root();
        dom::text_nodes(root)
            .into_iter()
            .filter(|node| {
                node.as_text().is_some_and(|text| has_glyph(&text.borrow()))
                    && node.parent().is_some()
                    && !scope.is_excluded(node)
                    && !dom::inside_tag(node, &["script", "style"], root)
                    && !node
                        .ancestors()
                        .take_while(|ancestor| ancestor != root)
                        .any(|ancestor| dom::has_class(&ancestor, PROCESSED_CLASS))
            })
            .collect()
    }
}

impl Builder for CardSymbolBuilder {
    fn stage(&self) -> Stage {
        Stage::CardSymbols
    }

    fn run(&mut self, scope: &Scope, _diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        if dom::has_class(scope.root(), PROCESSED_CLASS) {
            return Ok(0);
        }
        let mut symbols = 0;
        for node in Self::candidates(scope) {
            let (Some(parent), Some(text)) = (node.parent(), node.as_text()) else {
                continue;
            };
            let value = text.borrow().clone();
            let (replacement, found) = colorize(&value);
            if found == 0 {
                continue;
            }
            dom::add_class(&parent, PROCESSED_CLASS);
            for piece in replacement {
                node.insert_before(piece);
            }
            node.detach();
            symbols += found;
        }
        tracing::debug!(symbols, "Colorized card symbols");
        Ok(symbols)
    }
}
