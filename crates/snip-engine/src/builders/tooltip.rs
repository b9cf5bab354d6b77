//! Tooltips: `{{tooltip-content: key}}` definitions and
//! `{{tooltip-title: key}}` references.
//!
//! Definitions are collected from the whole root before any reference is
//! resolved, so a reference may appear before its definition.

use std::collections::HashSet;

use kuchiki::{NodeRef, Selectors};

use super::{BlockBuilder, Builder, Expansion, expand_blocks};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::dom::{self, TextMap, element, element_with_text};
use crate::error::EngineError;
use crate::extract::ExtractedFragment;
use crate::locate::MarkerSpan;
use crate::marker::{BlockMarker, TOOLTIP_CONTENT, TOOLTIP_TITLE, clean_payload};
use crate::pipeline::Stage;
use crate::root::Scope;

/// Tooltip definitions in document order: key to raw HTML.
///
/// Keys are matched case-sensitively after trimming; the first definition
/// of a key wins.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TooltipDefinitions {
    entries: Vec<(String, String)>,
}

impl TooltipDefinitions {
    /// Add a definition unless the key is taken. Returns whether it was added.
    pub fn insert(&mut self, key: impl Into<String>, html: impl Into<String>) -> bool {
        let key = key.into();
        if self.contains(&key) {
            return false;
        }
        self.entries.push((key, html.into()));
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, html)| html.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Element id suffix for a tooltip key.
///
/// Whitespace runs become `-`, the result is lowercased, and anything
/// outside `[a-z0-9-]` is dropped.
fn slug(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// First phase: consume `{{tooltip-content}}` spans into the map.
struct DefinitionCollector<'a> {
    definitions: &'a mut TooltipDefinitions,
}

impl BlockBuilder for DefinitionCollector<'_> {
    fn stage(&self) -> Stage {
        Stage::Tooltips
    }

    fn marker(&self) -> &'static BlockMarker {
        &TOOLTIP_CONTENT
    }

    fn build(
        &mut self,
        span: &MarkerSpan,
        fragment: ExtractedFragment,
        diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError> {
        let key = span.payload_or_empty();
        if self.definitions.contains(key) {
            diagnostics.report(
                Stage::Tooltips,
                DiagnosticKind::DuplicateDefinition,
                format!("{{{{tooltip-content: {key}}}}} is already defined; keeping the first"),
            );
            return Ok(Expansion::Skip);
        }
        self.definitions.insert(key, fragment.to_html());
        Ok(Expansion::Consume)
    }
}

/// Builds tooltip references, the hidden definitions block and the popover
/// node.
pub(crate) struct TooltipBuilder<'a> {
    definitions: &'a mut TooltipDefinitions,
    reported: &'a mut HashSet<String>,
    scope: &'a Selectors,
}

impl<'a> TooltipBuilder<'a> {
    pub(crate) fn new(
        definitions: &'a mut TooltipDefinitions,
        reported: &'a mut HashSet<String>,
        scope: &'a Selectors,
    ) -> Self {
        Self {
            definitions,
            reported,
            scope,
        }
    }

    fn reference(key: &str) -> NodeRef {
        let id = format!("tooltip-{}", slug(key));
        let label = format!("Tooltip: {key}");
        let span = element(
            "span",
            &[
                ("class", "tooltip-ref"),
                ("data-tooltip-id", &id),
                ("data-tooltip-key", key),
                ("tabindex", "0"),
                ("role", "button"),
                ("aria-label", &label),
            ],
        );
        span.append(element_with_text("span", &[("class", "tooltip-title")], key));
        span
    }

    /// Replace the references inside one scope element.
    fn resolve_in(
        &mut self,
        host: &NodeRef,
        scope: &Scope,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let mut resolved = 0;
        let mut search_from = 0;
        loop {
            let map = TextMap::new(host);
            let Some(captures) = TOOLTIP_TITLE.captures_at(map.text(), search_from) else {
                break;
            };
            let (Some(whole), Some(raw_key)) = (captures.get(0), captures.get(1)) else {
                break;
            };
            let (Some(start), Some(end), Some(first)) = (
                map.point(whole.start()),
                map.point(whole.end()),
                map.node_at(whole.start()),
            ) else {
                break;
            };
            // Nested scope elements handle their own text.
            let owner = dom::closest_within(&first, self.scope, scope.root());
            let handled = first.ancestors().any(|node| {
                dom::has_class(&node, "tooltip-ref") || dom::has_class(&node, "tooltip-unresolved")
            });
            if owner.as_ref() != Some(host) || handled {
                search_from = whole.end();
                continue;
            }

            let key = clean_payload(raw_key.as_str());
            let replacement = if self.definitions.contains(&key) {
                resolved += 1;
                Self::reference(&key)
            } else {
                if self.reported.insert(key.clone()) {
                    diagnostics.report(
                        Stage::Tooltips,
                        DiagnosticKind::UnresolvedReference,
                        format!(
                            "{{{{tooltip-title: {key}}}}} has no {{{{tooltip-content: {key}}}}} definition"
                        ),
                    );
                }
                element_with_text("span", &[("class", "tooltip-unresolved")], whole.as_str())
            };
            search_from = whole.start() + replacement.text_contents().len();
            dom::replace_range(host, &start, &end, vec![replacement]);
        }
        resolved
    }

    /// Re-emit the definitions for the client as a hidden block.
    fn emit_definitions(&self, root: &NodeRef, existing: Option<NodeRef>, popover: Option<&NodeRef>) {
        if self.definitions.is_empty() {
            if let Some(existing) = existing {
                existing.detach();
            }
            return;
        }
        let container = element(
            "div",
            &[("class", "tooltip-definitions"), ("hidden", "")],
        );
        for (key, html) in self.definitions.iter() {
            let id = format!("tooltip-{}", slug(key));
            let definition = element(
                "div",
                &[
                    ("class", "tooltip-definition"),
                    ("data-tooltip-key", key),
                    ("id", &id),
                ],
            );
            for node in dom::parse_fragment(html) {
                definition.append(node);
            }
            container.append(definition);
        }
        match (existing, popover) {
            (Some(existing), _) => {
                existing.insert_before(container);
                existing.detach();
            }
            (None, Some(popover)) => popover.insert_before(container),
            (None, None) => place_outside(root, container),
        }
    }
}

/// Append to `<body>`, or right after the root when there is no body.
fn place_outside(root: &NodeRef, node: NodeRef) {
    match dom::owning_body(root) {
        Some(body) => body.append(node),
        None => root.insert_after(node),
    }
}

/// Document-wide lookup of an element with `class`.
fn find_by_class(document: &NodeRef, class: &str) -> Option<NodeRef> {
    document
        .inclusive_descendants()
        .find(|node| dom::is_tag(node, "div") && dom::has_class(node, class))
}

/// Definitions emitted by an earlier run.
fn load_definitions(container: &NodeRef, definitions: &mut TooltipDefinitions) {
    for definition in dom::element_children(container) {
        if let Some(key) = dom::attr(&definition, "data-tooltip-key") {
            definitions.insert(key, dom::inner_html(&definition));
        }
    }
}

impl Builder for TooltipBuilder<'_> {
    fn stage(&self) -> Stage {
        Stage::Tooltips
    }

    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError> {
        let root = scope.root();
        let existing = find_by_class(scope.document(), "tooltip-definitions");
        self.definitions.clear();
        if let Some(existing) = &existing {
            load_definitions(existing, &mut *self.definitions);
        }

        expand_blocks(
            &mut DefinitionCollector {
                definitions: &mut *self.definitions,
            },
            scope,
            diagnostics,
        )?;
        tracing::debug!(definitions = self.definitions.len(), "Collected tooltip definitions");

        let mut resolved = 0;
        for host in dom::select_all(root, self.scope) {
            if scope.is_excluded(&host) {
                continue;
            }
            resolved += self.resolve_in(&host, scope, diagnostics);
        }

        let mut popover = find_by_class(scope.document(), "tooltip-popover");
        let has_references = root
            .descendants()
            .any(|node| dom::has_class(&node, "tooltip-ref"));
        if popover.is_none() && has_references {
            let node = element("div", &[("class", "tooltip-popover"), ("role", "tooltip")]);
            place_outside(root, node.clone());
            popover = Some(node);
        }
        self.emit_definitions(root, existing, popover.as_ref());

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builders::testing::scope;

    fn run_tooltips(content: &str) -> (String, String, usize, Diagnostics, TooltipDefinitions) {
        let scope = scope(content);
        let selectors =
            Selectors::compile("p, li, figcaption, .kg-callout-text, h1, h2, h3, h4, h5, h6")
                .unwrap();
        let mut definitions = TooltipDefinitions::default();
        let mut reported = HashSet::new();
        let mut diagnostics = Diagnostics::default();
        let widgets = TooltipBuilder::new(&mut definitions, &mut reported, &selectors)
            .run(&scope, &mut diagnostics)
            .unwrap();
        let body = dom::owning_body(scope.root()).unwrap();
        (
            dom::inner_html(scope.root()),
            dom::inner_html(&body),
            widgets,
            diagnostics,
            definitions,
        )
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Big  Word"), "big-word");
        assert_eq!(slug("C++ (lang)"), "c-lang");
        assert_eq!(slug("Термин"), "");
    }

    #[test]
    fn test_reference_before_definition_resolves() {
        let (html, _, widgets, diagnostics, definitions) = run_tooltips(
            "<p>See {{tooltip-title: API}} here.</p><p>{{tooltip-content: API}}</p><p>Application <b>programming</b> interface</p><p>{{/tooltip-content}}</p>",
        );
        assert_eq!(widgets, 1);
        assert!(diagnostics.is_empty());
        assert_eq!(
            definitions.get("API"),
            Some("<p>Application <b>programming</b> interface</p>")
        );
        assert_eq!(
            html,
            concat!(
                "<p>See ",
                r#"<span aria-label="Tooltip: API" class="tooltip-ref" data-tooltip-id="tooltip-api" data-tooltip-key="API" role="button" tabindex="0">"#,
                r#"<span class="tooltip-title">API</span></span> here.</p>"#,
            )
        );
    }

    #[test]
    fn test_popover_and_definitions_are_emitted_once() {
        let content = "<p>{{tooltip-title: k}}</p><p>{{tooltip-content: k}}Value{{/tooltip-content}}</p>";
        let (_, body, _, _, _) = run_tooltips(content);
        assert_eq!(body.matches(r#"class="tooltip-popover""#).count(), 1);
        assert!(body.contains(
            r#"<div class="tooltip-definitions" hidden=""><div class="tooltip-definition" data-tooltip-key="k" id="tooltip-k">Value</div></div>"#
        ));
    }

    #[test]
    fn test_duplicate_definition_first_wins() {
        let (html, _, _, diagnostics, definitions) = run_tooltips(
            "<p>{{tooltip-content: k}}one{{/tooltip-content}}</p><p>{{tooltip-content: k}}two{{/tooltip-content}}</p>",
        );
        assert_eq!(definitions.get("k"), Some("one"));
        assert_eq!(diagnostics.count(DiagnosticKind::DuplicateDefinition), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::OrphanedCloser), 0);
        assert_eq!(html, "<p>{{tooltip-content: k}}two{{/tooltip-content}}</p>");
    }

    #[test]
    fn test_unresolved_reference_is_inert_and_reported_once() {
        let (html, _, widgets, diagnostics, _) = run_tooltips(
            "<p>{{tooltip-title: nope}} and {{tooltip-title: nope}}</p>",
        );
        assert_eq!(widgets, 0);
        assert_eq!(diagnostics.count(DiagnosticKind::UnresolvedReference), 1);
        assert_eq!(
            html,
            r#"<p><span class="tooltip-unresolved">{{tooltip-title: nope}}</span> and <span class="tooltip-unresolved">{{tooltip-title: nope}}</span></p>"#
        );
    }

    #[test]
    fn test_references_outside_scope_are_ignored() {
        let (html, _, widgets, _, _) = run_tooltips(
            "<div>{{tooltip-title: k}}</div><p>{{tooltip-content: k}}v{{/tooltip-content}}</p>",
        );
        assert_eq!(widgets, 0);
        assert_eq!(html, "<div>{{tooltip-title: k}}</div>");
    }
}
