//! Widget builders, one module per snippet type.
//!
//! Every builder implements [`Builder`]: the orchestrator calls
//! [`Builder::run`] once per content root and gets back the number of
//! widgets produced. Builders for paired block markers implement
//! [`BlockBuilder`] instead and share the scan loop in [`expand_blocks`].

mod announcement;
mod cleanup;
mod color;
mod grid;
mod quote_author;
mod reveal;
mod symbols;
mod title_case;
mod toggle;
mod tooltip;

use kuchiki::NodeRef;

pub(crate) use announcement::AnnouncementBuilder;
pub(crate) use cleanup::CleanupBuilder;
pub(crate) use color::ColorBuilder;
pub(crate) use grid::{GridBuilder, IconBlockBuilder};
pub(crate) use quote_author::QuoteAuthorBuilder;
pub(crate) use reveal::RevealBuilder;
pub(crate) use symbols::CardSymbolBuilder;
pub use symbols::card_color;
pub(crate) use title_case::TitleCaseBuilder;
pub use title_case::to_title_case;
pub(crate) use toggle::ToggleBuilder;
pub(crate) use tooltip::TooltipBuilder;
pub use tooltip::TooltipDefinitions;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::EngineError;
use crate::extract::{ExtractedFragment, extract};
use crate::locate::{Located, MarkerSpan, locate, orphan_closers};
use crate::marker::BlockMarker;
use crate::pipeline::Stage;
use crate::root::Scope;

/// A pipeline stage implementation.
pub(crate) trait Builder {
    fn stage(&self) -> Stage;

    /// Transform the scope, returning the number of widgets produced.
    ///
    /// Content problems are reported through `diagnostics`; an `Err` means
    /// the stage could not finish and the orchestrator moves on.
    fn run(&mut self, scope: &Scope, diagnostics: &mut Diagnostics) -> Result<usize, EngineError>;
}

/// What a block builder wants done with a located span.
pub(crate) enum Expansion {
    /// Replace the span with a widget.
    Replace(NodeRef),
    /// Remove the span without a replacement.
    Consume,
    /// Leave the span untouched.
    Skip,
}

/// A builder for `{{kw: payload}}` ... `{{/kw}}` spans over root blocks.
pub(crate) trait BlockBuilder {
    fn stage(&self) -> Stage;

    fn marker(&self) -> &'static BlockMarker;

    /// Build the replacement for one span.
    fn build(
        &mut self,
        span: &MarkerSpan,
        fragment: ExtractedFragment,
        diagnostics: &mut Diagnostics,
    ) -> Result<Expansion, EngineError>;
}

/// Find, extract and expand every span of `builder`'s marker among the
/// root's blocks, then inside the content regions of earlier widgets.
pub(crate) fn expand_blocks<B: BlockBuilder>(
    builder: &mut B,
    scope: &Scope,
    diagnostics: &mut Diagnostics,
) -> Result<usize, EngineError> {
    let mut widgets = expand_in(builder, scope, scope.root(), diagnostics)?;
    for region in scope.widget_regions() {
        widgets += expand_in(builder, scope, &region, diagnostics)?;
    }
    tracing::debug!(stage = %builder.stage(), widgets, "Expanded block markers");
    Ok(widgets)
}

/// Scan loop over the blocks of one container; closers nothing claimed
/// are reported at the end.
fn expand_in<B: BlockBuilder>(
    builder: &mut B,
    scope: &Scope,
    container: &NodeRef,
    diagnostics: &mut Diagnostics,
) -> Result<usize, EngineError> {
    let marker = builder.marker();
    let stage = builder.stage();
    let mut claimed: Vec<NodeRef> = Vec::new();
    let mut widgets = 0;
    let mut from = 0;

    loop {
        let blocks = scope.blocks_in(container);
        let span = match locate(&blocks, marker, from) {
            None => break,
            Some(Located::Unterminated { index, payload, .. }) => {
                let opener = match payload {
                    Some(payload) => format!("{{{{{}: {payload}}}}}", marker.keyword()),
                    None => format!("{{{{{}}}}}", marker.keyword()),
                };
                diagnostics.report(
                    stage,
                    DiagnosticKind::Unterminated,
                    format!("{opener} has no closing {}", marker.closer_text()),
                );
                from = index + 1;
                continue;
            }
            Some(Located::Span(span)) => span,
        };

        let (fragment, edit) = extract(&span, &blocks, marker.keyword())?;
        match builder.build(&span, fragment, diagnostics)? {
            Expansion::Replace(widget) => {
                edit.commit(Some(&widget));
                widgets += 1;
                from = scope
                    .blocks_in(container)
                    .iter()
                    .position(|block| *block == widget)
                    .map_or(span.start + 1, |index| index + 1);
            }
            Expansion::Consume => {
                edit.commit(None);
                from = span.start;
            }
            Expansion::Skip => {
                claimed.push(span.end_element.clone());
                from = span.end + 1;
            }
        }
    }

    for index in orphan_closers(&scope.blocks_in(container), marker, &claimed) {
        diagnostics.report(
            stage,
            DiagnosticKind::OrphanedCloser,
            format!(
                "{} in block {index} has no matching opener",
                marker.closer_text()
            ),
        );
    }
    Ok(widgets)
}
