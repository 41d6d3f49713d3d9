//! User-facing progress reporting.
//!
//! All printing is decorative: write and color errors are discarded so a
//! closed stderr or redirected pipe never breaks a run. The quiet flag
//! silences the manager entirely; components call it unconditionally and
//! never branch on verbosity themselves.

use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Reporter handed to every pipeline component.
#[derive(Debug)]
pub struct OutputManager {
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    pub fn new(quiet: bool, no_ansi: bool) -> Self {
        let color = if no_ansi {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Self { quiet, color }
    }

    /// Bold header naming the installer being processed.
    pub fn section(&self, title: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stdout(self.color);
        let _ = stream.set_color(ColorSpec::new().set_bold(true));
        let _ = writeln!(stream, "{title}");
        let _ = writeln!(stream, "{}", "─".repeat(title.chars().count()));
        let _ = stream.reset();
    }

    /// One progress line for a pipeline step.
    pub fn step(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stdout(self.color);
        let _ = writeln!(stream, "  {message}");
    }

    /// Green confirmation once an artifact exists.
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stdout(self.color);
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = writeln!(stream, "  ✓ {message}");
        let _ = stream.reset();
    }

    /// Non-fatal problem worth the user's attention.
    pub fn warn(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stderr(self.color);
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(stream, "  ! {message}");
        let _ = stream.reset();
    }

    /// Fatal problem, printed before the process exits non-zero.
    pub fn error(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut stream = StandardStream::stderr(self.color);
        let _ = stream.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(stream, "  ✗ {message}");
        let _ = stream.reset();
    }
}
