//! Content grids and icon blocks.
//!
//! `{{grid: 2}}` and `{{grid: 3}}` map to fixed column classes; any other
//! value becomes a raw `grid-template-columns`. Icon blocks
//! (`{{question-mark}}`, `{{exclamation-mark}}`, `{{search-mark}}`) are a
//! two-column grid with the icon in the first column.

use super::{BlockBuilder, Builder, Expansion, expand_blocks};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{element, parse_fragment};
use crate::error::EngineError;
use crate::extract::ExtractedFragment;
use crate::locate::MarkerSpan;
use crate::marker::{
    BlockMarker, EXCLAMATION_MARK, GRID, QUESTION_MARK, SEARCH_MARK, is_safe_style_value,
};
use crate::pipeline::Stage;
use crate::root::Scope;

const QUESTION_MARK_SVG: &str = include_str!("../../assets/icons/question-mark.svg");
const EXCLAMATION_MARK_SVG: &str = include_str!("../../assets/icons/exclamation-mark.svg");
const SEARCH_MARK_SVG: &str = include_str!("../../assets/icons/search-mark.svg");

const ICON_GRID_STYLE: &str = "grid-template-columns: 4rem 1fr; align-items: center";

/// Icon block kinds, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Icon {
    QuestionMark,
    ExclamationMark,
    SearchMark,
}

impl Icon {
    const ALL: [Icon; 3] = [Icon::QuestionMark, Icon::ExclamationMark, Icon::SearchMark];

    fn marker(self) -> &'static BlockMarker {
        match self {
            Self::QuestionMark => &QUESTION_MARK,
            Self::ExclamationMark => &EXCLAMATION_MARK,
            Self::SearchMark => &SEARCH_MARK,
        }
    }

    fn svg(self) -> &'static str {
        match self {
            Self::QuestionMark => QUESTION_MARK_SVG,
            Self::ExclamationMark => EXCLAMATION_MARK_SVG,
            Self::SearchMark => SEARCH_MARK_SVG,
        }
    }
}

/// Builds icon blocks for all three icon kinds.
#[derive(Debug)]
pub(crate) struct IconBlockBuilder {
    icon: Icon,
}

impl IconBlockBuilder {
    pub(crate) fn new() -> Self {
        Self {
            icon: Icon::QuestionMark,
        }
    }
}

impl BlockBuilder for IconBlockBuilder {
    fn stage(&self) -> Stage {
        Stage::IconBlocks
    }

    fn marker(&self) -> &'static BlockMarker {
        self.icon.marker()
    }

    fn build(
        &mut self,
        _span: &MarkerSpan,
        fragment: ExtractedFragment,
        _diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError> {
        let container = element("div", &[("class", "content-grid"), ("style", ICON_GRID_STYLE)]);

        let icon = element("div", &[]);
        for node in parse_fragment(self.icon.svg().trim()) {
            icon.append(node);
        }
        container.append(icon);

        let content = element("div", &[]);
        fragment.append_to(&content);
        container.append(content);

        Ok(Expansion::Replace(container))
    }
}

impl Builder for IconBlockBuilder {
    fn stage(&self) -> Stage {
        Stage::IconBlocks
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let mut widgets = 0;
        for icon in Icon::ALL {
            self.icon = icon;
            widgets += expand_blocks(self, scope, diagnostics)?;
        }
        Ok(widgets)
    }
}

/// Builds `{{grid: V}}` containers.
#[derive(Debug, Default)]
pub(crate) struct GridBuilder;

impl GridBuilder {
    pub(crate) fn new() -> Self {
        Self
    }
}

impl BlockBuilder for GridBuilder {
    fn stage(&self) -> Stage {
        Stage::Grids
    }

    fn marker(&self) -> &'static BlockMarker {
        &GRID
    }

    fn build(
        &mut self,
        span: &MarkerSpan,
        fragment: ExtractedFragment,
        diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError> {
        let value = span.payload_or_empty();
        let container = match value {
            "2" => element("div", &[("class", "content-grid col-2")]),
            "3" => element("div", &[("class", "content-grid col-3")]),
            columns if is_safe_style_value(columns) => element(
                "div",
                &[
                    ("class", "content-grid"),
                    ("style", &format!("grid-template-columns: {columns}")),
                ],
            ),
            columns => {
                diagnostics.report(
                    Stage::Grids,
                    DiagnosticKind::InvalidValue,
                    format!("{{{{grid: {columns}}}}} is not a usable column template"),
                );
                return Ok(Expansion::Skip);
            }
        };
        fragment.append_to(&container);
        Ok(Expansion::Replace(container))
    }
}

impl Builder for GridBuilder {
    fn stage(&self) -> Stage {
        Stage::Grids
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        expand_blocks(self, scope, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::run;

    #[test]
    fn test_fixed_column_classes() {
        let (html, widgets, _) = run(
            &mut GridBuilder::new(),
            "<p>{{grid: 3}}</p><p>a</p><p>b</p><p>c</p><p>{{/grid}}</p>",
        );
        assert_eq!(widgets, 1);
        assert_eq!(
            html,
            r#"<div class="content-grid col-3"><p>a</p><p>b</p><p>c</p></div>"#
        );
    }

    #[test]
    fn test_custom_template() {
        let (html, _, _) = run(
            &mut GridBuilder::new(),
            "<p>{{grid: 1fr 2fr}}</p><p>a</p><p>b</p><p>{{/grid}}</p>",
        );
        assert_eq!(
            html,
            r#"<div class="content-grid" style="grid-template-columns: 1fr 2fr"><p>a</p><p>b</p></div>"#
        );
    }

    #[test]
    fn test_unsafe_template_is_left_alone() {
        let content = "<p>{{grid: 1fr; color: red}}</p><p>a</p><p>{{/grid}}</p>";
        let (html, widgets, diagnostics) = run(&mut GridBuilder::new(), content);
        assert_eq!(widgets, 0);
        assert_eq!(html, content);
        assert_eq!(diagnostics.count(DiagnosticKind::InvalidValue), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::OrphanedCloser), 0);
    }

    #[test]
    fn test_icon_blocks() {
        let (html, widgets, diagnostics) = run(
            &mut IconBlockBuilder::new(),
            "<p>{{question-mark}} Why?{{/question-mark}}</p><p>{{search-mark}}</p><p>Find</p><p>{{/search-mark}}</p>",
        );
        assert_eq!(widgets, 2);
        assert!(diagnostics.is_empty());
        assert_eq!(html.matches(ICON_GRID_STYLE).count(), 2);
        assert!(html.contains("<div>Why?</div>"));
        assert!(html.contains("<div><p>Find</p></div>"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_icon_kinds_do_not_pair_with_each_other() {
        let (_, widgets, diagnostics) = run(
            &mut IconBlockBuilder::new(),
            "<p>{{question-mark}}</p><p>x</p><p>{{/exclamation-mark}}</p>",
        );
        assert_eq!(widgets, 0);
        assert_eq!(diagnostics.count(DiagnosticKind::Unterminated), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::OrphanedCloser), 1);
    }
}
