//! Pipeline orchestration.
//!
//! An [`Engine`] is built once per page (or per batch of pages sharing a
//! configuration). It owns the compiled selectors and the state that must
//! survive between stages of one render: the tooltip definitions, the set
//! of unresolved keys already reported, and the title-case cache.

use std::collections::{HashMap, HashSet};

use kuchiki::traits::TendrilSink;
use kuchiki::{NodeRef, Selectors};

use crate::builders::{
    AnnouncementBuilder, Builder, CardSymbolBuilder, CleanupBuilder, ColorBuilder, GridBuilder,
    IconBlockBuilder, QuoteAuthorBuilder, RevealBuilder, TitleCaseBuilder, ToggleBuilder,
    TooltipBuilder, TooltipDefinitions,
};
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::dom;
use crate::error::EngineError;
use crate::pipeline::Stage;
use crate::popover::Popover;
use crate::root::{ContentRoot, Scope};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    /// Widgets, spans and rewritten headings produced.
    pub widgets: usize,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Serialized output of a render.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub html: String,
    pub report: Report,
}

struct CompiledSelectors {
    root: Selectors,
    announcement: Selectors,
    tooltip_scope: Selectors,
    color_scope: Selectors,
    color_exclude: Selectors,
    cleanup: Option<Selectors>,
}

fn compile(field: &'static str, selector: &str) -> Result<Selectors, EngineError> {
    let invalid = || EngineError::InvalidSelector {
        field,
        selector: selector.to_owned(),
    };
    if selector.trim().is_empty() {
        return Err(invalid());
    }
    Selectors::compile(selector).map_err(|()| invalid())
}

impl CompiledSelectors {
    fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let cleanup = if config.cleanup_selectors.is_empty() {
            None
        } else {
            Some(compile(
                "content.cleanup",
                &config.cleanup_selectors.join(", "),
            )?)
        };
        Ok(Self {
            root: compile("content.root", &config.root_selector)?,
            announcement: compile("announcement.selectors", &config.announcement.selectors)?,
            tooltip_scope: compile("tooltip.scope", &config.tooltip_scope)?,
            color_scope: compile("color.scope", &config.color_scope)?,
            color_exclude: compile("color.exclude", &config.color_exclude)?,
            cleanup,
        })
    }
}

fn validate(config: &EngineConfig) -> Result<(), EngineError> {
    if config.ready_class.split_whitespace().count() > 1 {
        return Err(EngineError::InvalidConfig(format!(
            "ready class '{}' must be a single class name",
            config.ready_class
        )));
    }
    if config.popover.width <= 0.0 {
        return Err(EngineError::InvalidConfig(
            "popover width must be positive".to_owned(),
        ));
    }
    if config.announcement.enabled && config.announcement.palette.is_empty() {
        return Err(EngineError::InvalidConfig(
            "announcement palette is empty".to_owned(),
        ));
    }
    Ok(())
}

/// Classes of the hidden blocks the tooltip stage places next to the root.
const HOISTED: [&str; 2] = ["tooltip-definitions", "tooltip-popover"];

/// Snippet expansion engine.
pub struct Engine {
    config: EngineConfig,
    selectors: CompiledSelectors,
    definitions: TooltipDefinitions,
    reported: HashSet<String>,
    title_cache: HashMap<String, String>,
}

impl Engine {
    /// Validate the configuration and compile its selectors.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        validate(&config)?;
        let selectors = CompiledSelectors::new(&config)?;
        Ok(Self {
            config,
            selectors,
            definitions: TooltipDefinitions::default(),
            reported: HashSet::new(),
            title_cache: HashMap::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Definitions collected by the last tooltip stage.
    pub fn tooltip_definitions(&self) -> &TooltipDefinitions {
        &self.definitions
    }

    /// Parse a complete page, process it and serialize it back.
    pub fn render_document(&mut self, html: &str) -> Rendered {
        let document = kuchiki::parse_html().one(html);
        let report = self.process_document(&document);
        Rendered {
            html: document.to_string(),
            report,
        }
    }

    /// Process `html` as the inner markup of a content root.
    ///
    /// The output is the root's transformed inner markup followed by
    /// anything the tooltip stage placed next to the root (the hidden
    /// definitions and the popover).
    pub fn render_fragment(&mut self, html: &str) -> Rendered {
        let document = kuchiki::parse_html().one("<!DOCTYPE html><html><body></body></html>");
        let Some(body) = dom::owning_body(&document) else {
            return Rendered {
                html: html.to_owned(),
                report: Report::default(),
            };
        };
        let container = dom::element("div", &[]);
        for node in dom::parse_fragment(html) {
            container.append(node);
        }
        body.append(container.clone());
        // Blocks an earlier render emitted after the root go back outside it.
        for node in dom::element_children(&container) {
            if HOISTED.iter().any(|class| dom::has_class(&node, class)) {
                body.append(node);
            }
        }

        let root = ContentRoot::new(container.clone());
        let report = self.process_root(&root);

        let mut output = dom::inner_html(&container);
        for sibling in container.following_siblings() {
            output.push_str(&dom::outer_html(&sibling));
        }
        Rendered {
            html: output,
            report,
        }
    }

    /// Run the announcement stage and every content stage against a page.
    pub fn process_document(&mut self, document: &NodeRef) -> Report {
        let mut diagnostics = Diagnostics::default();
        let root = ContentRoot::find(document, &self.selectors.root);
        let mut widgets = 0;

        if self.config.stage_enabled(Stage::Announcement) {
            let builder =
                AnnouncementBuilder::new(&self.config.announcement, &self.selectors.announcement);
            match builder.run(document, root.as_ref().map(ContentRoot::node), &mut diagnostics) {
                Ok(spans) => widgets += spans,
                Err(err) => stage_failed(Stage::Announcement, &err, &mut diagnostics),
            }
        }

        match root {
            Some(root) => widgets += self.run_content(&root, &mut diagnostics),
            None => diagnostics.report(
                Stage::Setup,
                DiagnosticKind::MissingRoot,
                format!("no element matches '{}'", self.config.root_selector),
            ),
        }
        finish(widgets, diagnostics)
    }

    /// Run the content stages against one root.
    pub fn process_root(&mut self, root: &ContentRoot) -> Report {
        let mut diagnostics = Diagnostics::default();
        let widgets = self.run_content(root, &mut diagnostics);
        finish(widgets, diagnostics)
    }

    /// Popover controller for a processed root, if it has any tooltip
    /// references.
    pub fn popover(&self, root: &ContentRoot) -> Option<Popover> {
        let triggers: Vec<NodeRef> = root
            .node()
            .descendants()
            .filter(|node| dom::has_class(node, "tooltip-ref"))
            .collect();
        if triggers.is_empty() {
            return None;
        }
        let node = root
            .document()
            .inclusive_descendants()
            .find(|node| dom::has_class(node, "tooltip-popover"))?;
        Some(Popover::new(
            node,
            triggers,
            self.definitions.clone(),
            self.config.popover,
        ))
    }

    fn run_content(&mut self, root: &ContentRoot, diagnostics: &mut Diagnostics) -> usize {
        self.reported.clear();
        let scope = Scope::new(root, &self.selectors.color_exclude);
        let mut widgets = 0;
        for stage in Stage::CONTENT {
            if !self.config.stage_enabled(stage) {
                tracing::debug!(stage = %stage, "Stage disabled");
                continue;
            }
            match self.run_stage(stage, &scope, diagnostics) {
                Ok(produced) => {
                    tracing::debug!(stage = %stage, produced, "Stage finished");
                    widgets += produced;
                }
                Err(err) => stage_failed(stage, &err, diagnostics),
            }
        }
        widgets
    }

    fn run_stage(
        &mut self,
        stage: Stage,
        scope: &Scope,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize, EngineError> {
        let selectors = &self.selectors;
        let mut builder: Box<dyn Builder + '_> = match stage {
            Stage::IconBlocks => Box::new(IconBlockBuilder::new()),
            Stage::Grids => Box::new(GridBuilder::new()),
            Stage::Tooltips => Box::new(TooltipBuilder::new(
                &mut self.definitions,
                &mut self.reported,
                &selectors.tooltip_scope,
            )),
            Stage::TitleCase => Box::new(TitleCaseBuilder::new(&mut self.title_cache)),
            Stage::CardSymbols => Box::new(CardSymbolBuilder::new()),
            Stage::Color => Box::new(ColorBuilder::new(&selectors.color_scope)),
            Stage::RevealAnswer => Box::new(RevealBuilder::new()),
            Stage::Toggle => Box::new(ToggleBuilder::new()),
            Stage::QuoteAuthor => Box::new(QuoteAuthorBuilder::new()),
            Stage::Cleanup => Box::new(CleanupBuilder::new(
                selectors.cleanup.as_ref(),
                &self.config.ready_class,
            )),
            Stage::Announcement | Stage::Setup => return Ok(0),
        };
        builder.run(scope, diagnostics)
    }
}

fn stage_failed(stage: Stage, err: &EngineError, diagnostics: &mut Diagnostics) {
    tracing::error!(stage = %stage, error = %err, "Stage failed");
    diagnostics.report(stage, DiagnosticKind::StageFailed, err.to_string());
}

fn finish(widgets: usize, diagnostics: Diagnostics) -> Report {
    tracing::info!(widgets, diagnostics = diagnostics.len(), "Processed page");
    Report {
        diagnostics: diagnostics.into_vec(),
        widgets,
    }
}
