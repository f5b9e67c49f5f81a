//! User-facing notifications.

use std::process::Command;
use std::thread;

/// Receives jukebox messages such as "now playing".
pub trait Notifier: Send {
    fn notify(&self, message: &str);
}

/// Writes notifications to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "midijuke::notify", "{}", message);
    }
}

/// Runs a desktop notification program with the message as last argument.
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Splits `command` on whitespace: program first, then fixed arguments.
    /// Returns `None` for a blank command.
    pub fn new(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, message: &str) {
        match Command::new(&self.program).args(&self.args).arg(message).spawn() {
            Ok(mut child) => {
                // Reap in the background so the jukebox never blocks on it
                thread::spawn(move || child.wait());
            }
            Err(e) => {
                tracing::warn!("Failed to run {}: {}", self.program, e);
                tracing::info!(target: "midijuke::notify", "{}", message);
            }
        }
    }
}

/// A command notifier when `command` is set and non-blank, else the log.
pub fn notifier_from(command: Option<&str>) -> Box<dyn Notifier> {
    match command.and_then(CommandNotifier::new) {
        Some(notifier) => Box::new(notifier),
        None => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_split() {
        let notifier = CommandNotifier::new("notify-send -t 2000").unwrap();
        assert_eq!(notifier.program, "notify-send");
        assert_eq!(notifier.args, vec!["-t", "2000"]);
        assert!(CommandNotifier::new("   ").is_none());
    }

    #[test]
    fn test_missing_program_does_not_panic() {
        let notifier = CommandNotifier::new("/nonexistent/notifier").unwrap();
        notifier.notify("hello");
    }
}
