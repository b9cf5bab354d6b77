//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod render;

pub(crate) use check::CheckArgs;
pub(crate) use render::RenderArgs;

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use snip_config::{AnnouncementConfig, Config, PopoverConfig};
use snip_engine::{AnnouncementSettings, EngineConfig, PaletteColor, PopoverSettings, Stage};

use crate::error::CliError;

/// Path argument meaning "read from stdin".
const STDIN: &str = "-";

/// Read the input markup from a file, or from stdin for `-`.
pub(crate) fn read_input(input: &Path) -> Result<String, CliError> {
    if input.as_os_str() == STDIN {
        let mut html = String::new();
        std::io::stdin().read_to_string(&mut html)?;
        return Ok(html);
    }
    std::fs::read_to_string(input).map_err(|err| {
        CliError::Validation(format!("cannot read {}: {err}", input.display()))
    })
}

/// Name used for the input in messages.
pub(crate) fn source_name(input: &Path) -> String {
    if input.as_os_str() == STDIN {
        "<stdin>".to_owned()
    } else {
        input.display().to_string()
    }
}

/// Convert the loaded file configuration into the engine's typed form.
pub(crate) fn engine_config(config: &Config) -> Result<EngineConfig, CliError> {
    let mut engine_config = EngineConfig::new()
        .with_root_selector(&config.content.root)
        .with_ready_class(&config.content.ready_class)
        .with_cleanup_selectors(config.content.cleanup.clone())
        .with_announcement(announcement_settings(&config.announcement)?)
        .with_tooltip_scope(&config.tooltip.scope)
        .with_color_scope(&config.color.scope, &config.color.exclude)
        .with_popover(popover_settings(&config.popover));

    for name in &config.stages.disabled {
        let stage = Stage::from_name(name)
            .ok_or_else(|| CliError::Validation(format!("unknown stage '{name}'")))?;
        engine_config = engine_config.with_disabled_stage(stage);
    }
    Ok(engine_config)
}

fn announcement_settings(
    announcement: &AnnouncementConfig,
) -> Result<AnnouncementSettings, CliError> {
    let palette = announcement
        .palette
        .iter()
        .map(|(name, entry)| {
            let background = entry.background().ok_or_else(|| {
                CliError::Validation(format!(
                    "announcement.palette.{name}: cannot derive a background from '{}'",
                    entry.hex
                ))
            })?;
            Ok(PaletteColor::new(name, &entry.hex, background))
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    Ok(AnnouncementSettings {
        enabled: announcement.enabled,
        selectors: announcement.selectors.clone(),
        fallback_scan: announcement.fallback_scan,
        text_color: announcement.text_color.clone(),
        palette,
    })
}

fn popover_settings(popover: &PopoverConfig) -> PopoverSettings {
    PopoverSettings {
        show_delay: Duration::from_millis(popover.show_delay_ms),
        hide_delay: Duration::from_millis(popover.hide_delay_ms),
        reposition_debounce: Duration::from_millis(popover.reposition_debounce_ms),
        offset: popover.offset,
        width: popover.width,
        margin: popover.margin,
        fallback_height: popover.fallback_height,
        hover: popover.hover,
    }
}
