//! Configuration management for snip.
//!
//! Parses `snip.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! Every section is optional; a missing file or an empty file yields the
//! defaults the engine was designed around (`.gh-content` content root,
//! the green/yellow announcement palette, 300/100 ms popover timings).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "snip.toml";

/// Stage names accepted in `[stages] disabled`.
pub const STAGE_NAMES: &[&str] = &[
    "announcement",
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
];

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the content root selector.
    pub root: Option<String>,
    /// Additional stages to disable.
    pub disabled_stages: Vec<String>,
    /// Override announcement processing.
    pub announcement_enabled: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Content root configuration.
    pub content: ContentConfig,
    /// Pipeline stage toggles.
    pub stages: StagesConfig,
    /// Announcement bar configuration.
    pub announcement: AnnouncementConfig,
    /// Tooltip reference scope.
    pub tooltip: TooltipConfig,
    /// Inline color scope.
    pub color: ColorConfig,
    /// Popover timings and geometry.
    pub popover: PopoverConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Content root configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Selector list locating the content root; the first match wins.
    pub root: String,
    /// Class added to the root once the pipeline has run.
    pub ready_class: String,
    /// Selectors of helper elements removed by the cleanup stage.
    pub cleanup: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: ".gh-content, .js-toc-content".to_owned(),
            ready_class: "snippets-ready".to_owned(),
            cleanup: vec![".snippet-title".to_owned()],
        }
    }
}

/// Pipeline stage toggles.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    /// Stage names to skip (see [`STAGE_NAMES`]).
    pub disabled: Vec<String>,
}

/// Announcement bar configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Whether the announcement bar is processed at all.
    pub enabled: bool,
    /// Selector list locating the bar.
    pub selectors: String,
    /// Scan the page for a bar-like element when no selector matches.
    pub fallback_scan: bool,
    /// Text color applied to the bar and its paragraphs.
    pub text_color: String,
    /// Named palette entries selected with `[[Name]]`.
    ///
    /// A `[announcement.palette]` table in the file replaces the defaults.
    pub palette: BTreeMap<String, PaletteEntry>,
}

impl Default for AnnouncementConfig {
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

fn default_palette() -> BTreeMap<String, PaletteEntry> {
    BTreeMap::from([
        (
            "green".to_owned(),
            PaletteEntry {
                hex: "#AAFBB2".to_owned(),
                background: None,
            },
        ),
        (
            "yellow".to_owned(),
            PaletteEntry {
                hex: "#F8D72B".to_owned(),
                background: None,
            },
        ),
    ])
}

/// A named announcement color.
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteEntry {
    /// Accent color used for `{{color}}` spans (`#RGB` or `#RRGGBB`).
    pub hex: String,
    /// Explicit bar background. Derived from `hex` when omitted.
    pub background: Option<String>,
}

impl PaletteEntry {
    /// Bar background: the explicit value, or a 10% tint of `hex` over the
    /// dark base color.
    ///
    /// Returns `None` when `hex` is not a valid hex color and no explicit
    /// background is set.
    pub fn background(&self) -> Option<String> {
        if let Some(background) = &self.background {
            return Some(background.clone());
        }
        let (r, g, b) = parse_hex_color(&self.hex)?;
        Some(format!(
            "linear-gradient(0deg, rgba({r}, {g}, {b}, 0.10) 0%, rgba({r}, {g}, {b}, 0.10) 100%), #1E1E21"
        ))
    }
}

/// Parse `#RGB` or `#RRGGBB` into components.
fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let digits = value.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut channels = digits
                .chars()
                .map(|c| u8::from_str_radix(&c.to_string().repeat(2), 16).ok());
            Some((channels.next()??, channels.next()??, channels.next()??))
        }
        6 => Some((
            u8::from_str_radix(&digits[0..2], 16).ok()?,
            u8::from_str_radix(&digits[2..4], 16).ok()?,
            u8::from_str_radix(&digits[4..6], 16).ok()?,
        )),
        _ => None,
    }
}

/// Tooltip configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    /// Elements whose text may hold `{{tooltip-title: key}}` references.
    pub scope: String,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            scope: "p, li, figcaption, .kg-callout-text, h1, h2, h3, h4, h5, h6".to_owned(),
        }
    }
}

/// Inline color configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Elements whose text may hold `{{color: value}}` markers.
    pub scope: String,
    /// Containers inside the content root that color processing never enters.
    pub exclude: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            scope: "p, li, figcaption, .kg-callout-text, h1, h2, h3, h4, h5, h6, \
                    blockquote, td, th"
                .to_owned(),
            exclude: ".announcement-bar, [class*=\"announcement\"]".to_owned(),
        }
    }
}

/// Popover timings (milliseconds) and geometry (CSS pixels).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PopoverConfig {
    /// Hover intent before showing.
    pub show_delay_ms: u64,
    /// Grace period before hiding.
    pub hide_delay_ms: u64,
    /// Debounce for scroll/resize repositioning.
    pub reposition_debounce_ms: u64,
    /// Gap between trigger and popover.
    pub offset: f64,
    /// Popover width used for horizontal clamping.
    pub width: f64,
    /// Minimum distance to the viewport edges.
    pub margin: f64,
    /// Height assumed when the host cannot measure the popover.
    pub fallback_height: f64,
    /// Whether hover events are honoured (disable for touch-only hosts).
    pub hover: bool,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            show_delay_ms: 300,
            hide_delay_ms: 100,
            reposition_debounce_ms: 100,
            offset: 8.0,
            width: 320.0,
            margin: 20.0,
            fallback_height: 200.0,
            hover: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a CSS class name (no whitespace, no selector punctuation).
fn require_class_name(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '.' | '#' | '[' | ']' | ',' | '>'))
    {
        return Err(ConfigError::Validation(format!(
            "{field} must be a bare class name, got '{value}'"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `snip.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, so CLI arguments take
    /// precedence over config file values. The result is validated again
    /// after the overrides.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(root) = &settings.root {
            self.content.root.clone_from(root);
        }
        for stage in &settings.disabled_stages {
            if !self.stages.disabled.contains(stage) {
                self.stages.disabled.push(stage.clone());
            }
        }
        if let Some(enabled) = settings.announcement_enabled {
            self.announcement.enabled = enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Selector syntax is checked by the engine when it compiles them; this
    /// only rejects values that can never be meaningful.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_content()?;
        self.validate_stages()?;
        self.validate_announcement()?;
        self.validate_popover()?;
        require_non_empty(&self.tooltip.scope, "tooltip.scope")?;
        require_non_empty(&self.color.scope, "color.scope")?;
        require_non_empty(&self.color.exclude, "color.exclude")?;
        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.content.root, "content.root")?;
        require_class_name(&self.content.ready_class, "content.ready_class")?;
        for selector in &self.content.cleanup {
            require_non_empty(selector, "content.cleanup")?;
        }
        Ok(())
    }

    fn validate_stages(&self) -> Result<(), ConfigError> {
        for name in &self.stages.disabled {
            if !STAGE_NAMES.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "stages.disabled: unknown stage '{name}' (expected one of: {})",
                    STAGE_NAMES.join(", ")
                )));
            }
        }
        Ok(())
    }

    fn validate_announcement(&self) -> Result<(), ConfigError> {
        let announcement = &self.announcement;
        if !announcement.enabled {
            return Ok(());
        }
        require_non_empty(&announcement.selectors, "announcement.selectors")?;
        require_non_empty(&announcement.text_color, "announcement.text_color")?;
        for (name, entry) in &announcement.palette {
            if name.trim().is_empty() || name.contains(']') {
                return Err(ConfigError::Validation(format!(
                    "announcement.palette: invalid palette name '{name}'"
                )));
            }
            if parse_hex_color(&entry.hex).is_none() {
                return Err(ConfigError::Validation(format!(
                    "announcement.palette.{name}.hex must be #RGB or #RRGGBB, got '{}'",
                    entry.hex
                )));
            }
        }
        Ok(())
    }

    fn validate_popover(&self) -> Result<(), ConfigError> {
        let popover = &self.popover;
        if popover.width <= 0.0 {
            return Err(ConfigError::Validation(
                "popover.width must be greater than 0".to_owned(),
            ));
        }
        if popover.offset < 0.0 || popover.margin < 0.0 {
            return Err(ConfigError::Validation(
                "popover.offset and popover.margin cannot be negative".to_owned(),
            ));
        }
        if popover.fallback_height <= 0.0 {
            return Err(ConfigError::Validation(
                "popover.fallback_height must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.content.root, ".gh-content, .js-toc-content");
        assert_eq!(config.content.ready_class, "snippets-ready");
        assert_eq!(config.content.cleanup, vec![".snippet-title".to_owned()]);
        assert!(config.announcement.enabled);
        assert_eq!(config.announcement.text_color, "#FFFFFF");
        assert_eq!(config.popover.show_delay_ms, 300);
        assert_eq!(config.popover.hide_delay_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.content.root, ".gh-content, .js-toc-content");
        assert_eq!(config.announcement.palette.len(), 2);
    }

    #[test]
    fn test_parse_content_config() {
        let toml = r#"
[content]
root = "article.post"
ready_class = "done"
cleanup = [".hidden-title", ".draft-note"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.content.root, "article.post");
        assert_eq!(config.content.ready_class, "done");
        assert_eq!(
            config.content.cleanup,
            vec![".hidden-title".to_owned(), ".draft-note".to_owned()]
        );
    }

    #[test]
    fn test_parse_popover_config() {
        let toml = r"
[popover]
show_delay_ms = 500
width = 280.0
hover = false
";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.popover.show_delay_ms, 500);
        assert_eq!(config.popover.hide_delay_ms, 100);
        assert!((config.popover.width - 280.0).abs() < f64::EPSILON);
        assert!(!config.popover.hover);
    }

    #[test]
    fn test_palette_table_replaces_defaults() {
        let toml = r##"
[announcement.palette.blue]
hex = "#3366FF"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.announcement.palette.len(), 1);
        assert!(config.announcement.palette.contains_key("blue"));
    }

    #[test]
    fn test_palette_background_derived_from_hex() {
        let entry = PaletteEntry {
            hex: "#F8D72B".to_owned(),
            background: None,
        };
        assert_eq!(
            entry.background().unwrap(),
            "linear-gradient(0deg, rgba(248, 215, 43, 0.10) 0%, rgba(248, 215, 43, 0.10) 100%), #1E1E21"
        );
    }

    #[test]
    fn test_palette_background_explicit() {
        let entry = PaletteEntry {
            hex: "#000".to_owned(),
            background: Some("black".to_owned()),
        };
        assert_eq!(entry.background().unwrap(), "black");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#AAFBB2"), Some((170, 251, 178)));
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("AAFBB2"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let settings = CliSettings {
            root: Some("main".to_owned()),
            disabled_stages: vec!["title-case".to_owned(), "title-case".to_owned()],
            announcement_enabled: Some(false),
        };
        config.apply_cli_settings(&settings);

        assert_eq!(config.content.root, "main");
        assert_eq!(config.stages.disabled, vec!["title-case".to_owned()]);
        assert!(!config.announcement.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.content.root, ".gh-content, .js-toc-content");
        assert!(config.stages.disabled.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snip.toml");
        std::fs::write(&path, "[stages]\ndisabled = [\"card-symbols\"]\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.stages.disabled, vec!["card-symbols".to_owned()]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/snip.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snip.toml");
        std::fs::write(&path, "[content\nroot = ").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_empty_root() {
        let mut config = Config::default();
        config.content.root = "  ".to_owned();
        assert_validation_error(&config, &["content.root"]);
    }

    #[test]
    fn test_validate_ready_class_with_dot() {
        let mut config = Config::default();
        config.content.ready_class = ".ready".to_owned();
        assert_validation_error(&config, &["content.ready_class", "bare class name"]);
    }

    #[test]
    fn test_validate_unknown_stage() {
        let mut config = Config::default();
        config.stages.disabled = vec!["footnotes".to_owned()];
        assert_validation_error(&config, &["unknown stage 'footnotes'"]);
    }

    #[test]
    fn test_validate_bad_palette_hex() {
        let mut config = Config::default();
        config.announcement.palette.insert(
            "red".to_owned(),
            PaletteEntry {
                hex: "red".to_owned(),
                background: None,
            },
        );
        assert_validation_error(&config, &["announcement.palette.red.hex"]);
    }

    #[test]
    fn test_validate_announcement_skipped_when_disabled() {
        let mut config = Config::default();
        config.announcement.enabled = false;
        config.announcement.selectors = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_color_exclude() {
        let mut config = Config::default();
        config.color.exclude = " ".to_owned();
        assert_validation_error(&config, &["color.exclude"]);
    }

    #[test]
    fn test_validate_popover_width_zero() {
        let mut config = Config::default();
        config.popover.width = 0.0;
        assert_validation_error(&config, &["popover.width"]);
    }

    #[test]
    fn test_validate_popover_negative_offset() {
        let mut config = Config::default();
        config.popover.offset = -1.0;
        assert_validation_error(&config, &["cannot be negative"]);
    }
}
