//! Title-casing of content headings.
//!
//! Heading text is cased word by word. The text nodes of a heading are
//! joined with a private-use separator so inline markup survives: the
//! separator is carried through as part of a word and the result is split
//! back onto the original nodes.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use kuchiki::NodeRef;
use regex::Regex;

use super::Builder;
use crate::diagnostics::Diagnostics;
use crate::dom;
use crate::error::EngineError;
use crate::pipeline::Stage;
use crate::root::Scope;

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Joins heading text nodes.
const SEPARATOR: char = '\u{E000}';

const SMALL_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "because", "but", "by", "en", "for", "if", "in", "neither",
    "nor", "of", "on", "only", "or", "over", "per", "so", "some", "than", "that", "the", "to",
    "up", "upon", "v", "versus", "via", "vs", "when", "with", "without", "yet",
];

/// Marker regions the casing must not touch.
static PROTECTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[\s\S]*?\}\}|\[\[[\s\S]*?\]\]").unwrap());

fn visible(text: &str) -> impl Iterator<Item = char> + '_ {
    text.chars().filter(|c| *c != SEPARATOR)
}

fn is_small(part: &str) -> bool {
    let lower: String = visible(part).collect::<String>().to_lowercase();
    SMALL_WORDS.contains(&lower.as_str())
}

/// Words that already carry deliberate casing: inner capitals (`iOS`,
/// `NASA`), dots (`node.js`), URLs and addresses.
fn is_kept(core: &str) -> bool {
    let inner_capital = visible(core).skip(1).any(char::is_uppercase);
    inner_capital || core.contains('.') || core.contains("://") || core.contains('@')
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    let mut out = String::with_capacity(part.len());
    for c in chars.by_ref() {
        if c == SEPARATOR {
            out.push(c);
            continue;
        }
        if c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        break;
    }
    out.extend(chars);
    out
}

fn case_word(word: &str, force: bool) -> String {
    let Some(start) = word.find(char::is_alphanumeric) else {
        return word.to_owned();
    };
    let end = word
        .char_indices()
        .filter(|(_, c)| c.is_alphanumeric())
        .last()
        .map_or(word.len(), |(index, c)| index + c.len_utf8());
    let core = &word[start..end];
    if is_kept(core) {
        return word.to_owned();
    }

    let cased: Vec<String> = core
        .split('-')
        .enumerate()
        .map(|(index, part)| {
            if (index == 0 && force) || !is_small(part) {
                capitalize(part)
            } else {
                part.to_lowercase()
            }
        })
        .collect();
    format!("{}{}{}", &word[..start], cased.join("-"), &word[end..])
}

/// Byte ranges of whitespace-separated words inside `range`.
fn collect_words(text: &str, range: Range<usize>, words: &mut Vec<Range<usize>>) {
    let mut word_start = None;
    for (offset, c) in text[range.clone()].char_indices() {
        let index = range.start + offset;
        match (c.is_whitespace(), word_start) {
            (true, Some(start)) => {
                words.push(start..index);
                word_start = None;
            }
            (false, None) => word_start = Some(index),
            _ => {}
        }
    }
    if let Some(start) = word_start {
        words.push(start..range.end);
    }
}

/// Title-case `text`.
///
/// Small words are lowercased unless they come first, last, or right after
/// a colon, question mark or exclamation mark. Every other word gets an
/// uppercase first letter. `{{...}}` and `[[...]]` regions are copied
/// through unchanged.
pub fn to_title_case(text: &str) -> String {
    let mut words = Vec::new();
    let mut last = 0;
    for protected in PROTECTED.find_iter(text) {
        collect_words(text, last..protected.start(), &mut words);
        last = protected.end();
    }
    collect_words(text, last..text.len(), &mut words);
    words.retain(|range| text[range.clone()].chars().any(char::is_alphanumeric));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut after_break = true;
    for (index, range) in words.iter().enumerate() {
        let word = &text[range.clone()];
        let force = after_break || index + 1 == words.len();
        out.push_str(&text[cursor..range.start]);
        out.push_str(&case_word(word, force));
        after_break = visible(word)
            .filter(|c| !matches!(c, '"' | '\'' | ')' | ']'))
            .last()
            .is_some_and(|c| matches!(c, ':' | '?' | '!'));
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Tooltip terms keep the casing of their key.
fn in_reference(node: &NodeRef, heading: &NodeRef) -> bool {
    node.ancestors()
        .take_while(|ancestor| ancestor != heading)
        .any(|ancestor| dom::has_class(&ancestor, "tooltip-ref"))
}

pub(crate) struct TitleCaseBuilder<'a> {
    cache: &'a mut HashMap<String, String>,
}

impl<'a> TitleCaseBuilder<'a> {
    pub(crate) fn new(cache: &'a mut HashMap<String, String>) -> Self {
        Self { cache }
    }

    fn case_heading(&mut self, heading: &NodeRef) -> bool {
        let nodes: Vec<NodeRef> = dom::text_nodes(heading)
            .into_iter()
            .filter(|node| !in_reference(node, heading))
            .collect();
        let texts: Vec<String> = nodes
            .iter()
            .filter_map(|node| node.as_text().map(|text| text.borrow().clone()))
            .collect();
        let joined = texts.join(&SEPARATOR.to_string());
        if joined.trim().is_empty() {
            return false;
        }

        let converted = self
            .cache
            .entry(joined.clone())
            .or_insert_with(|| to_title_case(&joined));
        if *converted == joined {
            return false;
        }
        let parts: Vec<&str> = converted.split(SEPARATOR).collect();
        if parts.len() != nodes.len() {
            return false;
        }
        for (node, part) in nodes.iter().zip(parts) {
            if let Some(text) = node.as_text() {
                part.clone_into(&mut text.borrow_mut());
            }
        }
        true
    }
}

impl Builder for TitleCaseBuilder<'_> {
    fn stage(&self) -> Stage {
        Stage::TitleCase
    }

    fn run(&mut self, scope: &Scope, _diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let headings: Vec<NodeRef> = scope
            .root()
            .descendants()
            .filter(|node| dom::tag_name(node).is_some_and(|tag| HEADINGS.contains(&tag)))
            .filter(|node| !scope.is_excluded(node))
            .collect();
        let total = headings.len();
        let mut changed = 0;
        for heading in headings {
            if self.case_heading(&heading) {
                changed += 1;
            }
        }
        tracing::debug!(headings = total, changed, "Title-cased headings");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::run;

    #[test]
    fn test_small_words() {
        assert_eq!(
            to_title_case("the lord of the rings"),
            "The Lord of the Rings"
        );
        assert_eq!(to_title_case("what are you looking at"), "What Are You Looking At");
        assert_eq!(to_title_case("Play A Game With Friends"), "Play a Game with Friends");
    }

    #[test]
    fn test_after_colon() {
        assert_eq!(
            to_title_case("chapter one: the beginning"),
            "Chapter One: The Beginning"
        );
    }

    #[test]
    fn test_kept_words() {
        assert_eq!(
            to_title_case("using iOS and NASA data in node.js"),
            "Using iOS and NASA Data in node.js"
        );
        assert_eq!(to_title_case("the 2nd round"), "The 2nd Round");
    }

    #[test]
    fn test_hyphenated_and_punctuated() {
        assert_eq!(to_title_case("a step-by-step guide"), "A Step-by-Step Guide");
        assert_eq!(to_title_case("\"quoted\" (aside) words"), "\"Quoted\" (Aside) Words");
    }

    #[test]
    fn test_markers_are_protected() {
        assert_eq!(
            to_title_case("why {{tooltip-title: my key}} matters"),
            "Why {{tooltip-title: my key}} Matters"
        );
        assert_eq!(to_title_case("[[green]] news for you"), "[[green]] News for You");
    }

    #[test]
    fn test_title_case_is_stable() {
        let once = to_title_case("a tale of two cities: the sequel");
        assert_eq!(to_title_case(&once), once);
    }

    #[test]
    fn test_headings_keep_inline_markup() {
        let mut cache = HashMap::new();
        let (html, changed, _) = run(
            &mut TitleCaseBuilder::new(&mut cache),
            "<h2>the <em>art</em> of war</h2><p>the body stays</p>",
        );
        assert_eq!(changed, 1);
        assert_eq!(html, "<h2>The <em>Art</em> of War</h2><p>the body stays</p>");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_tooltip_terms_are_left_alone() {
        let mut cache = HashMap::new();
        let (html, changed, _) = run(
            &mut TitleCaseBuilder::new(&mut cache),
            r#"<h2>why <span class="tooltip-ref" data-tooltip-key="api key"><span class="tooltip-title">api key</span></span> matters</h2>"#,
        );
        assert_eq!(changed, 1);
        assert_eq!(
            html,
            r#"<h2>Why <span class="tooltip-ref" data-tooltip-key="api key"><span class="tooltip-title">api key</span></span> Matters</h2>"#
        );
    }

    #[test]
    fn test_word_split_across_nodes() {
        let mut cache = HashMap::new();
        let (html, _, _) = run(
            &mut TitleCaseBuilder::new(&mut cache),
            "<h3><b>he</b>llo world</h3>",
        );
        assert_eq!(html, "<h3><b>He</b>llo World</h3>");
    }

    #[test]
    fn test_cache_is_reused() {
        let mut cache = HashMap::new();
        cache.insert("cached".to_owned(), "From Cache".to_owned());
        let (html, _, _) = run(&mut TitleCaseBuilder::new(&mut cache), "<h1>cached</h1>");
        assert_eq!(html, "<h1>From Cache</h1>");
    }
}
