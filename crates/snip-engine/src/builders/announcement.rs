//! Announcement bar colors: `[[Name]]` palette tags and
//! `{{color}}` ... `{{/color}}` accent spans.
//!
//! The bar lives outside the content root. Before anything is changed the
//! bar is checked against the root: a bar that is, contains, or sits inside
//! the root is never touched.

use kuchiki::{NodeRef, Selectors};

use crate::config::{AnnouncementSettings, PaletteColor};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, TextMap, element};
use crate::error::EngineError;
use crate::marker::{BAR_COLOR, PALETTE_TAG};
use crate::pipeline::Stage;

const TYPOGRAPHY: [(&str, &str); 5] = [
    ("font-size", "12px"),
    ("font-style", "normal"),
    ("font-weight", "500"),
    ("line-height", "18px"),
    ("letter-spacing", "0.17px"),
];

fn is_white(color: &str) -> bool {
    let color = color.trim().to_ascii_lowercase();
    color == "#ffffff" || color == "#fff" || color.replace(' ', "") == "rgb(255,255,255)"
}

pub(crate) struct AnnouncementBuilder<'a> {
    settings: &'a AnnouncementSettings,
    selectors: &'a Selectors,
}

impl<'a> AnnouncementBuilder<'a> {
    pub(crate) fn new(settings: &'a AnnouncementSettings, selectors: &'a Selectors) -> Self {
        Self {
            settings,
            selectors,
        }
    }

    /// Locate and style the bar. Returns the number of accent spans built.
    pub(crate) fn run(
        &self,
        document: &NodeRef,
        root: Option<&NodeRef>,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, EngineError> {
        let Some(bar) = self.find(document, root) else {
            tracing::debug!("No announcement bar");
            return Ok(0);
        };

        if let Some(root) = root
            && (dom::is_inclusive_descendant(root, &bar) || dom::is_inclusive_descendant(&bar, root))
        {
            diagnostics.report(
                Stage::Announcement,
                DiagnosticKind::BoundaryViolation,
                "announcement bar overlaps the content root; leaving both untouched",
            );
            return Ok(0);
        }

        let color = self.apply_palette(&bar, diagnostics);
        dom::set_style(&bar, &[("color", &self.settings.text_color)]);

        let spans = match color {
            Some(color) => Self::accent_spans(&bar, color),
            None => 0,
        };
        self.apply_typography(&bar);

        tracing::debug!(spans, "Styled announcement bar");
        Ok(spans)
    }

    fn find(&self, document: &NodeRef, root: Option<&NodeRef>) -> Option<NodeRef> {
        let inside_root =
            |node: &NodeRef| root.is_some_and(|root| dom::is_inclusive_descendant(node, root));

        if let Some(bar) = dom::select_first(document, self.selectors) {
            if !inside_root(&bar) {
                return Some(bar);
            }
            tracing::debug!("Ignoring announcement-like element inside the content root");
        }
        if !self.settings.fallback_scan {
            return None;
        }

        let looks_like_bar = |node: &NodeRef| {
            let text = node.text_contents();
            text.contains("[[") || text.contains("{{color")
        };
        let clear_of_root = |node: &NodeRef| {
            root.is_none_or(|root| {
                !dom::is_inclusive_descendant(root, node) && !dom::is_inclusive_descendant(node, root)
            })
        };

        let body = dom::owning_body(document)?;
        let direct = dom::element_children(&body);
        let nested = body.descendants().filter(|node| {
            dom::is_tag(node, "div")
                && node.parent().is_some_and(|parent| {
                    dom::is_tag(&parent, "body")
                        || dom::is_tag(&parent, "main")
                        || dom::has_class(&parent, "container-global")
                })
        });
        direct
            .into_iter()
            .chain(nested)
            .find(|node| clear_of_root(node) && looks_like_bar(node))
    }

    /// Resolve and remove the first `[[Name]]` tag, setting the bar background.
    fn apply_palette(&self, bar: &NodeRef, diagnostics: &mut Diagnostics) -> Option<&'a PaletteColor> {
        let map = TextMap::new(bar);
        let captures = PALETTE_TAG.captures(map.text())?;
        let (whole, name) = (captures.get(0)?, captures.get(1)?);

        let Some(color) = self.settings.color(name.as_str()) else {
            diagnostics.report(
                Stage::Announcement,
                DiagnosticKind::InvalidValue,
                format!("[[{}]] is not a palette color", name.as_str().trim()),
            );
            return None;
        };

        let (start, end) = (map.point(whole.start())?, map.point(whole.end())?);
        dom::delete_range(bar, &start, &end);
        dom::set_style(bar, &[("background", &color.background)]);
        Some(color)
    }

    /// Wrap `{{color}}` spans in the palette accent color.
    fn accent_spans(bar: &NodeRef, color: &PaletteColor) -> usize {
        let mut spans = 0;
        let mut search_from = 0;
        loop {
            let map = TextMap::new(bar);
            let Some(captures) = BAR_COLOR.captures_at(map.text(), search_from) else {
                break;
            };
            let (Some(whole), Some(content)) = (captures.get(0), captures.get(1)) else {
                break;
            };
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

            let span = element("span", &[]);
            let mut style = vec![("color", color.hex.as_str())];
            style.extend(TYPOGRAPHY);
            dom::set_style(&span, &style);
            dom::wrap_range(bar, (&open_start, &open_end), (&close_start, &close_end), &span);

            spans += 1;
            search_from = whole.start() + content.len();
        }
        spans
    }

    fn apply_typography(&self, bar: &NodeRef) {
        for node in bar.descendants() {
            if dom::is_tag(&node, "span") {
                match dom::style_property(&node, "color") {
                    Some(color) if !is_white(&color) => {
                        let missing: Vec<(&str, &str)> = TYPOGRAPHY
                            .into_iter()
                            .filter(|(property, _)| dom::style_property(&node, property).is_none())
                            .collect();
                        dom::set_style(&node, &missing);
                    }
                    _ => dom::set_style(&node, &TYPOGRAPHY),
                }
            } else if dom::is_tag(&node, "p") {
                let mut style = TYPOGRAPHY.to_vec();
                style.push(("color", &self.settings.text_color));
                style.push(("margin", "0"));
                dom::set_style(&node, &style);
            }
        }
    }
}
