use std::io::IsTerminal;

use tracing::debug;

/// How loudly a notice should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Success,
    Info,
    Danger,
}

/// A user-facing notice emitted by a store operation. Carries the message
/// key, not the resolved text, so the store stays language-agnostic; the
/// caller resolves it through the translator before display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub key: &'static str,
    pub severity: Severity,
}

impl Notice {
    pub fn new(key: &'static str, severity: Severity) -> Self {
        Self { key, severity }
    }
}

/// Transient-display collaborator for resolved notices.
pub trait Notifier {
    fn notify(&mut self, message: &str, severity: Severity);
}

/// Prints notices to stderr, colored by severity when stderr is a terminal.
#[derive(Debug, Clone)]
pub struct TermNotifier {
    color: bool,
}

impl TermNotifier {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl Notifier for TermNotifier {
    fn notify(&mut self, message: &str, severity: Severity) {
        debug!(?severity, message, "notice");
        let code = match severity {
            Severity::Warning => "33",
            Severity::Success => "32",
            Severity::Info => "36",
            Severity::Danger => "31",
        };

        if self.color && std::io::stderr().is_terminal() {
            eprintln!("\x1b[{code}m{message}\x1b[0m");
        } else {
            eprintln!("{message}");
        }
    }
}
