//! Engine configuration.
//!
//! `EngineConfig` is the typed record the engine is built from. Every
//! recognized key has an explicit default; selectors are compiled (and so
//! validated) once in [`Engine::new`](crate::Engine::new).

use std::time::Duration;

use crate::pipeline::Stage;

/// A named announcement color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteColor {
    /// Name used in `[[Name]]` tags, matched case-insensitively.
    pub name: String,
    /// Accent color for `{{color}}` spans in the bar.
    pub hex: String,
    /// Bar background.
    pub background: String,
}

impl PaletteColor {
    pub fn new(
        name: impl Into<String>,
        hex: impl Into<String>,
        background: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
            background: background.into(),
        }
    }
}

fn default_palette() -> Vec<PaletteColor> {
    vec![
        PaletteColor::new(
            "green",
            "#AAFBB2",
            "linear-gradient(0deg, rgba(170, 251, 178, 0.10) 0%, rgba(170, 251, 178, 0.10) 100%), #1E1E21",
        ),
        PaletteColor::new(
            "yellow",
            "#F8D72B",
            "linear-gradient(0deg, rgba(248, 215, 43, 0.10) 0%, rgba(248, 215, 43, 0.10) 100%), #1E1E21",
        ),
    ]
}

/// Announcement bar settings.
#[derive(Debug, Clone)]
pub struct AnnouncementSettings {
    pub enabled: bool,
    /// Selector list locating the bar; the first match wins.
    pub selectors: String,
    /// Scan for a bar-like element outside the content root when no
    /// selector matches.
    pub fallback_scan: bool,
    pub text_color: String,
    pub palette: Vec<PaletteColor>,
}

impl Default for AnnouncementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            selectors: ".gh-announcement, .gh-announcement-bar, [data-announcement], \
                        .announcement-bar, .gh-site-announcement"
                .to_owned(),
            fallback_scan: true,
            text_color: "#FFFFFF".to_owned(),
            palette: default_palette(),
        }
    }
}

impl AnnouncementSettings {
    /// Palette entry for a `[[Name]]` tag.
    pub fn color(&self, name: &str) -> Option<&PaletteColor> {
        let name = name.trim();
        self.palette
            .iter()
            .find(|color| color.name.eq_ignore_ascii_case(name))
    }
}

/// Popover timings and geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopoverSettings {
    pub show_delay: Duration,
    pub hide_delay: Duration,
    pub reposition_debounce: Duration,
    /// Gap between the trigger and the popover, in CSS pixels.
    pub offset: f64,
    pub width: f64,
    /// Minimum horizontal distance to the viewport edges.
    pub margin: f64,
    /// Height assumed when the host cannot measure the popover.
    pub fallback_height: f64,
    /// Honour pointer enter/leave events.
    pub hover: bool,
}

impl Default for PopoverSettings {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(300),
            hide_delay: Duration::from_millis(100),
            reposition_debounce: Duration::from_millis(100),
            offset: 8.0,
            width: 320.0,
            margin: 20.0,
            fallback_height: 200.0,
            hover: true,
        }
    }
}

/// Configuration for [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Selector list locating the content root.
    ///
    /// Default: `.gh-content, .js-toc-content`
    pub root_selector: String,
    /// Class added to the root by the cleanup stage.
    ///
    /// Default: `snippets-ready`
    pub ready_class: String,
    /// Helper elements removed by the cleanup stage.
    pub cleanup_selectors: Vec<String>,
    /// Stages that are skipped.
    pub disabled_stages: Vec<Stage>,
    pub announcement: AnnouncementSettings,
    /// Elements whose text may hold tooltip references.
    pub tooltip_scope: String,
    /// Elements whose text may hold inline color markers.
    pub color_scope: String,
    /// Containers inside the root that color processing never enters.
    pub color_exclude: String,
    pub popover: PopoverSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_selector: ".gh-content, .js-toc-content".to_owned(),
            ready_class: "snippets-ready".to_owned(),
            cleanup_selectors: vec![".snippet-title".to_owned()],
            disabled_stages: Vec::new(),
            announcement: AnnouncementSettings::default(),
            tooltip_scope: "p, li, figcaption, .kg-callout-text, h1, h2, h3, h4, h5, h6"
                .to_owned(),
            color_scope: "p, li, figcaption, .kg-callout-text, h1, h2, h3, h4, h5, h6, \
                          blockquote, td, th"
                .to_owned(),
            color_exclude: ".announcement-bar, [class*=\"announcement\"]".to_owned(),
            popover: PopoverSettings::default(),
        }
    }

    /// Set the content root selector.
    #[must_use]
    pub fn with_root_selector(mut self, selector: impl Into<String>) -> Self {
        self.root_selector = selector.into();
        self
    }

    /// Set the class marking a processed root.
    #[must_use]
    pub fn with_ready_class(mut self, class: impl Into<String>) -> Self {
        self.ready_class = class.into();
        self
    }

    /// Set the selectors removed by the cleanup stage.
    #[must_use]
    pub fn with_cleanup_selectors(mut self, selectors: Vec<String>) -> Self {
        self.cleanup_selectors = selectors;
        self
    }

    /// Skip a stage.
    #[must_use]
    pub fn with_disabled_stage(mut self, stage: Stage) -> Self {
        if !self.disabled_stages.contains(&stage) {
            self.disabled_stages.push(stage);
        }
        self
    }

    /// Set the announcement bar settings.
    #[must_use]
    pub fn with_announcement(mut self, announcement: AnnouncementSettings) -> Self {
        self.announcement = announcement;
        self
    }

    /// Set the tooltip reference scope.
    #[must_use]
    pub fn with_tooltip_scope(mut self, scope: impl Into<String>) -> Self {
        self.tooltip_scope = scope.into();
        self
    }

    /// Set the inline color scope and exclusion list.
    #[must_use]
    pub fn with_color_scope(mut self, scope: impl Into<String>, exclude: impl Into<String>) -> Self {
        self.color_scope = scope.into();
        self.color_exclude = exclude.into();
        self
    }

    /// Set popover timings and geometry.
    #[must_use]
    pub fn with_popover(mut self, popover: PopoverSettings) -> Self {
        self.popover = popover;
        self
    }

    /// Whether a stage runs.
    pub fn stage_enabled(&self, stage: Stage) -> bool {
        if stage == Stage::Announcement && !self.announcement.enabled {
            return false;
        }
        !self.disabled_stages.contains(&stage)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.root_selector, ".gh-content, .js-toc-content");
        assert_eq!(config.popover.show_delay, Duration::from_millis(300));
        assert!(Stage::CONTENT.iter().all(|s| config.stage_enabled(*s)));
        assert!(config.stage_enabled(Stage::Announcement));
    }

    #[test]
    fn test_disabled_stage() {
        let config = EngineConfig::new()
            .with_disabled_stage(Stage::TitleCase)
            .with_disabled_stage(Stage::TitleCase);
        assert_eq!(config.disabled_stages, vec![Stage::TitleCase]);
        assert!(!config.stage_enabled(Stage::TitleCase));
    }

    #[test]
    fn test_announcement_disabled_by_flag() {
        let config = EngineConfig::new().with_announcement(AnnouncementSettings {
            enabled: false,
            ..AnnouncementSettings::default()
        });
        assert!(!config.stage_enabled(Stage::Announcement));
    }

    #[test]
    fn test_palette_lookup_is_case_insensitive() {
        let settings = AnnouncementSettings::default();
        assert_eq!(settings.color("Green").unwrap().hex, "#AAFBB2");
        assert_eq!(settings.color(" YELLOW ").unwrap().hex, "#F8D72B");
        assert!(settings.color("Blue").is_none());
    }
}
