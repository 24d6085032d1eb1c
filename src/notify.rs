use colored::Colorize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

/// User-facing notification surface (toasts in a UI, lines on a terminal)
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}

/// Routes notifications into the tracing log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => info!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Error => error!("{}", message),
        }
    }
}

/// Prints notifications to the terminal
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let line = match severity {
            Severity::Success => format!("✓ {}", message).green(),
            Severity::Info => message.cyan(),
            Severity::Warning => format!("! {}", message).yellow(),
            Severity::Error => format!("✗ {}", message).red(),
        };
        println!("{}", line);
    }
}
