//! Block-span location over sibling block elements.
//!
//! A span starts at the first sibling whose text contains an opener and ends
//! at the nearest sibling (the start itself included, as long as the closer
//! comes after the opener) whose text contains a closer. Nested instances of
//! the same marker are not supported: the first closer always wins.

use std::ops::Range;

use kuchiki::NodeRef;

use crate::dom;
use crate::marker::BlockMarker;

/// A located `{{kw: payload}}` ... `{{/kw}}` pair.
#[derive(Debug, Clone)]
pub struct MarkerSpan {
    /// Index of the start element in the scanned sibling list.
    pub start: usize,
    /// Index of the end element (`>= start`).
    pub end: usize,
    pub start_element: NodeRef,
    pub end_element: NodeRef,
    /// Trimmed payload (`None` for payload-less markers).
    pub payload: Option<String>,
    /// Byte range of the opener in the start element's text content.
    pub opener: Range<usize>,
    /// Byte range of the closer in the end element's text content.
    pub closer: Range<usize>,
}

impl MarkerSpan {
    pub fn is_single_element(&self) -> bool {
        self.start == self.end
    }

    pub fn payload_or_empty(&self) -> &str {
        self.payload.as_deref().unwrap_or("")
    }
}

/// Result of a scan.
#[derive(Debug, Clone)]
pub enum Located {
    Span(MarkerSpan),
    /// An opener with no closer anywhere after it.
    Unterminated {
        index: usize,
        element: NodeRef,
        payload: Option<String>,
    },
}

/// Scan `siblings` from `from` for the first span of `marker`.
///
/// Returns `None` when no opener exists at or after `from`.
pub fn locate(siblings: &[NodeRef], marker: &BlockMarker, from: usize) -> Option<Located> {
    for (start, element) in siblings.iter().enumerate().skip(from) {
        if dom::is_widget(element) {
            continue;
        }
        let text = element.text_contents();
        let Some(opener) = marker.find_opener(&text) else {
            continue;
        };

        if let Some(closer) = marker.find_closer(&text, opener.range.end) {
            return Some(Located::Span(MarkerSpan {
                start,
                end: start,
                start_element: element.clone(),
                end_element: element.clone(),
                payload: opener.payload,
                opener: opener.range,
                closer,
            }));
        }

        for (end, candidate) in siblings.iter().enumerate().skip(start + 1) {
            if dom::is_widget(candidate) {
                continue;
            }
            let candidate_text = candidate.text_contents();
            if let Some(closer) = marker.find_closer(&candidate_text, 0) {
                return Some(Located::Span(MarkerSpan {
                    start,
                    end,
                    start_element: element.clone(),
                    end_element: candidate.clone(),
                    payload: opener.payload,
                    opener: opener.range,
                    closer,
                }));
            }
        }

        return Some(Located::Unterminated {
            index: start,
            element: element.clone(),
            payload: opener.payload,
        });
    }
    None
}

/// Indices of siblings still holding a closer, skipping `claimed` elements.
///
/// Run after a builder has consumed its spans: any closer left over has no
/// opener.
pub fn orphan_closers(siblings: &[NodeRef], marker: &BlockMarker, claimed: &[NodeRef]) -> Vec<usize> {
    siblings
        .iter()
        .enumerate()
        .filter(|(_, element)| !claimed.contains(*element) && !dom::is_widget(element))
        .filter(|(_, element)| marker.find_closer(&element.text_contents(), 0).is_some())
        .map(|(index, _)| index)
        .collect()
}
