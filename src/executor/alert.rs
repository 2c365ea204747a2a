// Operator-facing dialogs.
use std::sync::mpsc;
use std::time::Duration;

use rfd::{MessageButtons, MessageDialog, MessageLevel};

/// How long the give-up dialog waits before the run carries on without the operator.
pub const ERROR_DIALOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Notice,
    Error,
}

impl AlertLevel {
    /// Notices wait for the operator; errors give up after [`ERROR_DIALOG_TIMEOUT`].
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            AlertLevel::Notice => None,
            AlertLevel::Error => Some(ERROR_DIALOG_TIMEOUT),
        }
    }
}

/// User-visible alerts.
pub trait Notifier {
    fn alert(&mut self, level: AlertLevel, title: &str, message: &str);
}

/// Native message box. Returns once the operator dismisses it or the
/// level's timeout elapses, whichever comes first.
#[derive(Debug, Default)]
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn alert(&mut self, level: AlertLevel, title: &str, message: &str) {
        let timeout = level.timeout();
        tracing::debug!(title = %title, ?timeout, "showing dialog");

        // AppKit only shows dialogs from the main thread.
        let limit = match timeout {
            Some(limit) if !cfg!(target_os = "macos") => limit,
            _ => return show_dialog(level, title, message),
        };
        let (title, message) = (title.to_string(), message.to_string());
        if !wait_for_dialog(move || show_dialog(level, &title, &message), limit) {
            tracing::info!(?limit, "dialog not dismissed in time, continuing");
        }
    }
}

fn show_dialog(level: AlertLevel, title: &str, message: &str) {
    let level = match level {
        AlertLevel::Notice => MessageLevel::Info,
        AlertLevel::Error => MessageLevel::Error,
    };
    let _ = MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Runs `show` on its own thread and waits at most `limit` for it to return.
///
/// Returns false when the wait ran out. The dialog stays up until it is
/// dismissed or the process exits.
pub(crate) fn wait_for_dialog<F>(show: F, limit: Duration) -> bool
where
    F: FnOnce() + Send + 'static,
{
    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        show();
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(limit).is_ok()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub alerts: Vec<(AlertLevel, String, String)>,
    }

    impl Notifier for RecordingNotifier {
        fn alert(&mut self, level: AlertLevel, title: &str, message: &str) {
            self.alerts.push((level, title.to_string(), message.to_string()));
        }
    }
}
