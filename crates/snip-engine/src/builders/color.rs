//! Inline `{{color: value}}` ... `{{/color}}` spans inside the content root.

use kuchiki::{NodeRef, Selectors};

use super::Builder;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, TextMap, element};
use crate::error::EngineError;
use crate::marker::{COLOR_CLOSER, COLOR_OPENER, INLINE_COLOR, clean_payload, is_safe_style_value};
use crate::pipeline::Stage;
use crate::root::Scope;

/// Properties pinned to `inherit` so the span only changes the color.
const INHERITED: [&str; 6] = [
    "font-size",
    "font-style",
    "font-weight",
    "line-height",
    "letter-spacing",
    "margin",
];

fn color_span(value: &str) -> NodeRef {
    let span = element("span", &[]);
    let mut properties = vec![("color", value)];
    properties.extend(INHERITED.iter().map(|property| (*property, "inherit")));
    dom::set_style(&span, &properties);
    span
}

fn is_colored_span(node: &NodeRef) -> bool {
    dom::is_tag(node, "span") && dom::style_property(node, "color").is_some()
}

pub(crate) struct ColorBuilder<'a> {
    scope: &'a Selectors,
}

impl<'a> ColorBuilder<'a> {
    pub(crate) fn new(scope: &'a Selectors) -> Self {
        Self { scope }
    }

    fn color_in(&self, host: &NodeRef, scope: &Scope, diagnostics: &mut Diagnostics) -> usize {
        let mut spans = 0;
        let mut search_from = 0;
        loop {
            let map = TextMap::new(host);
            let Some(captures) = INLINE_COLOR.captures_at(map.text(), search_from) else {
                break;
            };
            let (Some(whole), Some(value), Some(content)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                break;
            };
            let (Some(first), Some(last)) = (map.node_at(whole.start()), map.node_at(whole.end() - 1))
            else {
                break;
            };

            let owned = [&first, &last].iter().all(|node| {
                dom::closest_within(node, self.scope, scope.root()).as_ref() == Some(host)
            });
            let colored = first
                .ancestors()
                .take_while(|node| node != host)
                .any(|node| is_colored_span(&node));
            if !owned || colored {
                search_from = whole.end();
                continue;
            }

            let value = clean_payload(value.as_str());
            if !is_safe_style_value(&value) {
                diagnostics.report(
                    Stage::Color,
                    DiagnosticKind::InvalidValue,
                    format!("{{{{color: {value}}}}} is not a usable color"),
                );
                search_from = content.start();
                continue;
            }

            let points = (
                map.point(whole.start()),
                map.point(content.start()),
                map.point(content.end()),
                map.point(whole.end()),
            );
            let (Some(open_start), Some(open_end), Some(close_start), Some(close_end)) = points
            else {
                break;
            };
            let span = color_span(&value);
            dom::wrap_range(
                host,
                (&open_start, &open_end),
                (&close_start, &close_end),
                &span,
            );
            spans += 1;
            search_from = whole.start() + content.len();
        }
        self.report_unpaired(host, scope, diagnostics);
        spans
    }

    /// Report openers and closers the paired scan left behind in `host`'s
    /// own text. Pairs skipped for other reasons are not reported again.
    fn report_unpaired(&self, host: &NodeRef, scope: &Scope, diagnostics: &mut Diagnostics) {
        let map = TextMap::new(host);
        let text = map.text();
        let paired: Vec<_> = INLINE_COLOR.find_iter(text).map(|m| m.range()).collect();
        let unpaired = |start: usize| {
            !paired.iter().any(|range| range.contains(&start))
                && map.node_at(start).is_some_and(|node| {
                    dom::closest_within(&node, self.scope, scope.root()).as_ref() == Some(host)
                })
        };

        for captures in COLOR_OPENER.captures_iter(text) {
            let (Some(whole), Some(value)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if unpaired(whole.start()) {
                diagnostics.report(
                    Stage::Color,
                    DiagnosticKind::Unterminated,
                    format!(
                        "{{{{color: {}}}}} has no closing {{{{/color}}}}",
                        clean_payload(value.as_str())
                    ),
                );
            }
        }
        for closer in COLOR_CLOSER.find_iter(text) {
            if unpaired(closer.start()) {
                diagnostics.report(
                    Stage::Color,
                    DiagnosticKind::OrphanedCloser,
                    "{{/color}} has no matching {{color: ...}} opener",
                );
            }
        }
    }
}

impl Builder for ColorBuilder<'_> {
    fn stage(&self) -> Stage {
        Stage::Color
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let mut spans = 0;
        for host in dom::select_all(scope.root(), self.scope) {
            if scope.is_excluded(&host) {
                continue;
            }
            spans += self.color_in(&host, scope, diagnostics);
        }
        tracing::debug!(spans, "Colored inline spans");
        Ok(spans)
    }
}
