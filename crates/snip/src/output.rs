//! Colored terminal output utilities.

use console::{Style, Term};
use snip_engine::{Diagnostic, Report};

/// Terminal output formatter.
///
/// Everything goes to stderr so stdout stays free for rendered HTML.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    dim: Style,
    cyan_bold: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            dim: Style::new().dim(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print an info message.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        let _ = self.term.write_line(&self.green.apply_to(msg).to_string());
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.red.apply_to(msg).to_string());
    }

    /// Print a highlighted message (cyan bold).
    pub(crate) fn highlight(&self, msg: &str) {
        let _ = self
            .term
            .write_line(&self.cyan_bold.apply_to(msg).to_string());
    }

    /// Print one diagnostic: the stage tag dimmed, the rest in yellow.
    pub(crate) fn diagnostic(&self, diagnostic: &Diagnostic) {
        let tag = format!("[{}]", diagnostic.stage.name());
        let _ = self.term.write_line(&format!(
            "  {} {}",
            self.dim.apply_to(tag),
            self.yellow
                .apply_to(format!("{}: {}", diagnostic.kind.as_str(), diagnostic.message))
        ));
    }

    /// Print every diagnostic of a report followed by a summary line.
    pub(crate) fn report(&self, source: &str, report: &Report) {
        if report.is_clean() {
            self.success(&format!(
                "{source}: {} widget(s), no problems found",
                report.widgets
            ));
            return;
        }
        self.highlight(&format!(
            "{source}: {} widget(s), {} diagnostic(s)",
            report.widgets,
            report.diagnostics.len()
        ));
        for diagnostic in &report.diagnostics {
            self.diagnostic(diagnostic);
        }
    }
}
