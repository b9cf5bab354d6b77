//! `{{toggle: Title}}` ... `{{/toggle}}` collapsible sections.

use super::{BlockBuilder, Builder, Expansion, expand_blocks};
use crate::diagnostics::Diagnostics;
use crate::dom::{self, element, element_with_text};
use crate::error::EngineError;
use crate::extract::ExtractedFragment;
use crate::locate::MarkerSpan;
use crate::marker::{BlockMarker, TOGGLE};
use crate::pipeline::Stage;
use crate::root::Scope;

/// Builds collapsed toggle widgets.
///
/// Content ids continue after the toggles already in the root, so a second
/// run never hands out an id twice.
#[derive(Debug, Default)]
pub(crate) struct ToggleBuilder {
    next_id: usize,
}

impl ToggleBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl BlockBuilder for ToggleBuilder {
    fn stage(&self) -> Stage {
        Stage::Toggle
    }

    fn marker(&self) -> &'static BlockMarker {
        &TOGGLE
    }

    fn build(
        &mut self,
        span: &MarkerSpan,
        fragment: ExtractedFragment,
        _diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError> {
        self.next_id += 1;
        let content_id = format!("toggle-content-{}", self.next_id);

        let container = element("div", &[("class", "toggle")]);
        let header = element(
            "button",
            &[
                ("class", "toggle__header"),
                ("type", "button"),
                ("aria-expanded", "false"),
                ("aria-controls", &content_id),
            ],
        );
        header.append(element_with_text(
            "span",
            &[("class", "toggle__title")],
            span.payload_or_empty(),
        ));
        header.append(element(
            "span",
            &[("class", "toggle__icon"), ("aria-hidden", "true")],
        ));
        container.append(header);

        let content = element("div", &[("class", "toggle__content"), ("id", &content_id)]);
        fragment.append_to(&content);
        container.append(content);

        Ok(Expansion::Replace(container))
    }
}

impl Builder for ToggleBuilder {
    fn stage(&self) -> Stage {
        Stage::Toggle
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        self.next_id = scope
            .root()
            .descendants()
            .filter(|node| dom::has_class(node, "toggle__content"))
            .count();
        expand_blocks(self, scope, diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::run;
    use crate::diagnostics::DiagnosticKind;

    // Attributes serialize in name order.
    const HEADER: &str = r#"<button aria-controls="toggle-content-1" aria-expanded="false" class="toggle__header" type="button"><span class="toggle__title">Title</span><span aria-hidden="true" class="toggle__icon"></span></button>"#;

    #[test]
    fn test_multi_paragraph_toggle() {
        let (html, widgets, diagnostics) = run(
            &mut ToggleBuilder::new(),
            "<p>{{toggle: Title}}</p><p>First</p><p>Second</p><p>{{/toggle}}</p>",
        );
        assert_eq!(widgets, 1);
        assert!(diagnostics.is_empty());
        assert_eq!(
            html,
            format!(
                r#"<div class="toggle">{HEADER}<div class="toggle__content" id="toggle-content-1"><p>First</p><p>Second</p></div></div>"#
            )
        );
    }

    #[test]
    fn test_two_toggles_get_distinct_ids() {
        let (html, widgets, _) = run(
            &mut ToggleBuilder::new(),
            "<p>{{toggle: A}}a{{/toggle}}</p><p>{{toggle: B}}b{{/toggle}}</p>",
        );
        assert_eq!(widgets, 2);
        assert!(html.contains(r#"id="toggle-content-1""#));
        assert!(html.contains(r#"id="toggle-content-2""#));
    }

    #[test]
    fn test_unterminated_and_orphan() {
        let (html, widgets, diagnostics) = run(
            &mut ToggleBuilder::new(),
            "<p>{{/toggle}}</p><p>{{toggle: Lost}} text</p>",
        );
        assert_eq!(widgets, 0);
        assert_eq!(html, "<p>{{/toggle}}</p><p>{{toggle: Lost}} text</p>");
        assert_eq!(diagnostics.count(DiagnosticKind::Unterminated), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::OrphanedCloser), 1);
    }

    #[test]
    fn test_toggle_inside_grid_cell() {
        let (html, widgets, diagnostics) = run(
            &mut ToggleBuilder::new(),
            r#"<div class="content-grid col-2"><p>{{toggle: T}}x{{/toggle}}</p><p>y</p></div>"#,
        );
        assert_eq!(widgets, 1);
        assert!(diagnostics.is_empty());
        assert!(html.starts_with(r#"<div class="content-grid col-2"><div class="toggle">"#));
        assert!(html.ends_with("<p>y</p></div>"));
    }
}
