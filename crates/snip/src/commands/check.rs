//! `snip check` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use snip_config::{CliSettings, Config};
use snip_engine::Engine;

use super::{engine_config, read_input, source_name};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    /// Input HTML file, or `-` to read from stdin.
    input: PathBuf,

    /// Path to configuration file (default: auto-discover snip.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Treat the input as the inner markup of a content root.
    #[arg(long)]
    fragment: bool,

    /// Exit with an error when any diagnostic is reported.
    #[arg(long)]
    strict: bool,

    /// Print the report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable verbose output (per-render summaries).
    #[arg(short, long)]
    pub verbose: bool,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid, the input cannot be
    /// read, or `--strict` is set and diagnostics were reported.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        // Empty settings still run validation
        let config = Config::load(self.config.as_deref(), Some(&CliSettings::default()))?;
        let mut engine = Engine::new(engine_config(&config)?)?;
        let html = read_input(&self.input)?;
        let report = if self.fragment {
            engine.render_fragment(&html).report
        } else {
            engine.render_document(&html).report
        };

        if self.json {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        } else {
            output.report(&source_name(&self.input), &report);
        }

        if self.strict && !report.is_clean() {
            return Err(CliError::Validation(format!(
                "{} diagnostic(s) reported",
                report.diagnostics.len()
            )));
        }
        Ok(())
    }
}
