//! Marker grammar.
//!
//! Openers are `{{keyword: payload}}` (or `{{keyword}}` for payload-less
//! icon blocks), closers are `{{/keyword}}`. The color marker also accepts the
//! legacy closer `{{color}}`. A payload runs to the first `}}`; `\}` inside
//! it is an escaped brace, and surrounding whitespace is trimmed.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Payload pattern: anything up to the first unescaped `}}`.
const PAYLOAD: &str = r"((?:\\\}|[^}]|\}[^}])+?)";

/// Trim a captured payload and resolve `\}` escapes.
pub(crate) fn clean_payload(raw: &str) -> String {
    raw.trim().replace("\\}", "}")
}

/// An opener found in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    /// Byte range of the whole marker.
    pub range: Range<usize>,
    /// Trimmed payload, `None` for payload-less markers.
    pub payload: Option<String>,
}

/// A paired block marker: one opener pattern and one closer pattern.
#[derive(Debug)]
pub struct BlockMarker {
    keyword: &'static str,
    opener: Regex,
    closer: Regex,
}

impl BlockMarker {
    /// `{{keyword: payload}}` ... `{{/keyword}}`.
    fn with_payload(keyword: &'static str) -> Self {
        let escaped = regex::escape(keyword);
        Self {
            keyword,
            opener: Regex::new(&format!(r"\{{\{{{escaped}:\s*{PAYLOAD}\s*\}}\}}")).unwrap(),
            closer: Regex::new(&format!(r"\{{\{{/{escaped}\}}\}}")).unwrap(),
        }
    }

    /// `{{keyword}}` ... `{{/keyword}}`.
    fn bare(keyword: &'static str) -> Self {
        let escaped = regex::escape(keyword);
        Self {
            keyword,
            opener: Regex::new(&format!(r"\{{\{{{escaped}\}}\}}")).unwrap(),
            closer: Regex::new(&format!(r"\{{\{{/{escaped}\}}\}}")).unwrap(),
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// First opener in `text`.
    pub fn find_opener(&self, text: &str) -> Option<Opener> {
        let captures = self.opener.captures(text)?;
        let whole = captures.get(0)?;
        Some(Opener {
            range: whole.range(),
            payload: captures.get(1).map(|m| clean_payload(m.as_str())),
        })
    }

    /// First closer in `text` starting at or after byte `from`.
    pub fn find_closer(&self, text: &str, from: usize) -> Option<Range<usize>> {
        self.closer.find_at(text, from).map(|m| m.range())
    }

    /// Human-readable closer, for diagnostics.
    pub fn closer_text(&self) -> String {
        format!("{{{{/{}}}}}", self.keyword)
    }
}

pub static TOGGLE: LazyLock<BlockMarker> = LazyLock::new(|| BlockMarker::with_payload("toggle"));
pub static REVEAL_ANSWER: LazyLock<BlockMarker> =
    LazyLock::new(|| BlockMarker::with_payload("reveal-answer"));
pub static TOOLTIP_CONTENT: LazyLock<BlockMarker> =
    LazyLock::new(|| BlockMarker::with_payload("tooltip-content"));
pub static GRID: LazyLock<BlockMarker> = LazyLock::new(|| BlockMarker::with_payload("grid"));
pub static QUESTION_MARK: LazyLock<BlockMarker> =
    LazyLock::new(|| BlockMarker::bare("question-mark"));
pub static EXCLAMATION_MARK: LazyLock<BlockMarker> =
    LazyLock::new(|| BlockMarker::bare("exclamation-mark"));
pub static SEARCH_MARK: LazyLock<BlockMarker> = LazyLock::new(|| BlockMarker::bare("search-mark"));

/// `{{tooltip-title: key}}`.
pub(crate) static TOOLTIP_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\{{\{{tooltip-title:\s*{PAYLOAD}\s*\}}\}}")).unwrap());

/// `{{correct: text}}` or `{{wrong: text}}`.
pub(crate) static ANSWER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\{{\{{(correct|wrong):\s*{PAYLOAD}\s*\}}\}}")).unwrap()
});

/// `{{color: value}}` ... `{{/color}}` (or legacy `{{color}}`).
pub(crate) static INLINE_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\{{\{{color:\s*{PAYLOAD}\s*\}}\}}([\s\S]*?)\{{\{{/?color\}}\}}"
    ))
    .unwrap()
});

/// `{{color: value}}` on its own.
pub(crate) static COLOR_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\{{\{{color:\s*{PAYLOAD}\s*\}}\}}")).unwrap());

/// `{{/color}}` on its own.
pub(crate) static COLOR_CLOSER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{/color\}\}").unwrap());

/// `{{color}}` ... `{{/color}}` (or legacy `{{color}}`), announcement bar only.
pub(crate) static BAR_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{color\}\}([\s\S]*?)\{\{/?color\}\}").unwrap());

/// `[[Name]]` palette tag.
pub(crate) static PALETTE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").unwrap());

/// `{{quote-author: Name}}`.
pub(crate) static QUOTE_AUTHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\{{\{{quote-author:\s*{PAYLOAD}\s*\}}\}}")).unwrap());

/// Reject values that could break out of an inline `style` attribute.
pub(crate) fn is_safe_style_value(value: &str) -> bool {
    !value.is_empty() && !value.contains([';', '{', '}', '<', '>', '"'])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_opener_with_payload() {
        let opener = TOGGLE.find_opener("before {{toggle:   My Title  }} after").unwrap();
        assert_eq!(opener.payload.as_deref(), Some("My Title"));
        assert_eq!(opener.range, 7..31);
    }

    #[test]
    fn test_opener_without_space_after_colon() {
        let opener = GRID.find_opener("{{grid:1fr 2fr}}").unwrap();
        assert_eq!(opener.payload.as_deref(), Some("1fr 2fr"));
    }

    #[test]
    fn test_payload_with_single_brace() {
        let opener = TOGGLE.find_opener("{{toggle: a}b}}").unwrap();
        assert_eq!(opener.payload.as_deref(), Some("a}b"));
    }

    #[test]
    fn test_payload_with_escaped_brace() {
        let opener = TOGGLE.find_opener(r"{{toggle: set \}}} rest").unwrap();
        assert_eq!(opener.payload.as_deref(), Some("set }"));
    }

    #[test]
    fn test_payload_stops_at_first_close() {
        let opener = TOGGLE.find_opener("{{toggle: A}} {{toggle: B}}").unwrap();
        assert_eq!(opener.payload.as_deref(), Some("A"));
    }

    #[test]
    fn test_bare_opener() {
        let opener = QUESTION_MARK.find_opener("{{question-mark}} Why?").unwrap();
        assert_eq!(opener.payload, None);
        assert_eq!(opener.range, 0..17);
        assert!(QUESTION_MARK.find_opener("{{question-mark: x}}").is_none());
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        assert!(TOGGLE.find_opener("{{Toggle: A}}").is_none());
    }

    #[test]
    fn test_closer_from_offset() {
        let text = "{{/toggle}} {{toggle: A}} x {{/toggle}}";
        assert_eq!(TOGGLE.find_closer(text, 0), Some(0..11));
        assert_eq!(TOGGLE.find_closer(text, 25), Some(28..39));
        assert_eq!(TOGGLE.closer_text(), "{{/toggle}}");
    }

    #[test]
    fn test_inline_color_accepts_legacy_closer() {
        let caps = INLINE_COLOR.captures("{{color: #f00}}red{{color}} x").unwrap();
        assert_eq!(&caps[1], "#f00");
        assert_eq!(&caps[2], "red");
    }

    #[test]
    fn test_answer_marker() {
        let found: Vec<(String, String)> = ANSWER
            .captures_iter("{{correct: Yes}} {{wrong:No }}")
            .map(|c| (c[1].to_owned(), clean_payload(&c[2])))
            .collect();
        assert_eq!(
            found,
            vec![
                ("correct".to_owned(), "Yes".to_owned()),
                ("wrong".to_owned(), "No".to_owned())
            ]
        );
    }

    #[test]
    fn test_safe_style_value() {
        assert!(is_safe_style_value("rgb(10, 20, 30)"));
        assert!(is_safe_style_value("1fr 2fr"));
        assert!(!is_safe_style_value("red; background: url(x)"));
        assert!(!is_safe_style_value("\"><script>"));
        assert!(!is_safe_style_value(""));
    }
}
