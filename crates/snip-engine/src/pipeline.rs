//! Declared pipeline stages.
//!
//! The content stages run in [`Stage::CONTENT`] order against one content
//! root. The order is load-bearing:
//!
//! - Block builders (icon blocks, grids, tooltip definitions) run before
//!   any inline text walker so the walkers never see their markers.
//! - Title-case and card symbols run before color, because color wraps text
//!   in styled spans and the earlier passes expect plain heading and
//!   paragraph text.
//! - Reveal-answer runs before toggle so an answer block inside a toggle is
//!   already a widget when the toggle extracts its content.
//! - Cleanup runs last and marks the root as processed.
//!
//! The announcement stage runs on its own, before the content stages, and
//! only ever touches the announcement bar.

use std::fmt;

/// A named pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "kebab-case")
)]
pub enum Stage {
    Announcement,
    IconBlocks,
    Grids,
    Tooltips,
    TitleCase,
    CardSymbols,
    Color,
    RevealAnswer,
    Toggle,
    QuoteAuthor,
    Cleanup,
    /// Pseudo-stage for problems found before any stage runs.
    Setup,
}

impl Stage {
    /// Content stages in execution order.
    pub const CONTENT: [Stage; 10] = [
        Stage::IconBlocks,
        Stage::Grids,
        Stage::Tooltips,
        Stage::TitleCase,
        Stage::CardSymbols,
        Stage::Color,
        Stage::RevealAnswer,
        Stage::Toggle,
        Stage::QuoteAuthor,
        Stage::Cleanup,
    ];

    /// Configuration name of the stage.
    pub fn name(self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::IconBlocks => "icon-blocks",
            Self::Grids => "grids",
            Self::Tooltips => "tooltips",
            Self::TitleCase => "title-case",
            Self::CardSymbols => "card-symbols",
            Self::Color => "color",
            Self::RevealAnswer => "reveal-answer",
            Self::Toggle => "toggle",
            Self::QuoteAuthor => "quote-author",
            Self::Cleanup => "cleanup",
            Self::Setup => "setup",
        }
    }

    /// Look up a configurable stage by name.
    pub fn from_name(name: &str) -> Option<Self> {
        std::iter::once(Self::Announcement)
            .chain(Self::CONTENT)
            .find(|stage| stage.name() == name)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_declared_order() {
        let names: Vec<&str> = Stage::CONTENT.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "icon-blocks",
                "grids",
                "tooltips",
                "title-case",
                "card-symbols",
                "color",
                "reveal-answer",
                "toggle",
                "quote-author",
                "cleanup",
            ]
        );
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Stage::from_name("title-case"), Some(Stage::TitleCase));
        assert_eq!(Stage::from_name("announcement"), Some(Stage::Announcement));
        assert_eq!(Stage::from_name("setup"), None);
        assert_eq!(Stage::from_name("Toggle"), None);
    }
}
