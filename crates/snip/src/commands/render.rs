//! `snip render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use snip_config::{CliSettings, Config};
use snip_engine::Engine;

use super::{engine_config, read_input, source_name};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Input HTML file, or `-` to read from stdin.
    input: PathBuf,

    /// Write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover snip.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat the input as the inner markup of a content root.
    #[arg(long)]
    fragment: bool,

    /// Content root selector (overrides config).
    #[arg(long, value_name = "SELECTOR")]
    root: Option<String>,

    /// Skip a pipeline stage (repeatable).
    #[arg(long = "disable", value_name = "STAGE")]
    disabled: Vec<String>,

    /// Leave the announcement bar untouched.
    #[arg(long)]
    no_announcement: bool,

    /// Enable verbose output (per-render summaries).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the input or output
    /// cannot be accessed. Content problems are reported, never returned.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            root: self.root,
            disabled_stages: self.disabled,
            announcement_enabled: self.no_announcement.then_some(false),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Using {}", path.display()));
        }

        let mut engine = Engine::new(engine_config(&config)?)?;
        let html = read_input(&self.input)?;
        let rendered = if self.fragment {
            engine.render_fragment(&html)
        } else {
            engine.render_document(&html)
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered.html)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(rendered.html.as_bytes())?;
                stdout.flush()?;
            }
        }

        if !rendered.report.is_clean() {
            output.report(&source_name(&self.input), &rendered.report);
        }
        Ok(())
    }
}
