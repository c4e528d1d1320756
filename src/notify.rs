//! Fire-and-forget notification side-channel shared by the account flows.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    Success,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotifyKind, message: &str);
}

/// Prints success to stdout and errors to stderr. Most recent call wins;
/// nothing is queued or acknowledged.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, kind: NotifyKind, message: &str) {
        match kind {
            NotifyKind::Success => println!("ok: {}", message),
            NotifyKind::Error => eprintln!("error: {}", message),
        }
    }
}
