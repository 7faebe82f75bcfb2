use log::debug;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// How long a notification stays up unless dismissed
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3000);

pub const SUCCESS_MESSAGE: &str = "New item added";
pub const DANGER_MESSAGE: &str = "That did not work, try again";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    pub visible: bool,
    pub kind: NotificationKind,
    pub message: String,
    pub expires_at: Option<Instant>,
}

impl Default for NotificationState {
    fn default() -> Self {
        NotificationState {
            visible: false,
            kind: NotificationKind::Success,
            message: String::new(),
            expires_at: None,
        }
    }
}

impl NotificationState {
    pub fn shown(kind: NotificationKind, message: String, expires_at: Instant) -> Self {
        NotificationState {
            visible: true,
            kind,
            message,
            expires_at: Some(expires_at),
        }
    }

    /// Keep kind and message so the last outcome can still be inspected
    pub fn hidden(self) -> Self {
        NotificationState {
            visible: false,
            expires_at: None,
            ..self
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        self.visible && self.expires_at.is_none_or(|at| now < at)
    }
}

/// Single-slot, auto-dismissing status display.
///
/// A new `show` replaces the visible notification and restarts the countdown;
/// the timer of a replaced notification never hides its successor.
pub struct NotificationController {
    sender: Arc<watch::Sender<NotificationState>>,
    timer: Mutex<Option<JoinHandle<()>>>,
    ttl: Duration,
}

impl Default for NotificationController {
    fn default() -> Self {
        NotificationController::new(NOTIFICATION_TTL)
    }
}

impl NotificationController {
    pub fn new(ttl: Duration) -> Self {
        let (sender, _) = watch::channel(NotificationState::default());
        NotificationController {
            sender: Arc::new(sender),
            timer: Mutex::new(None),
            ttl,
        }
    }

    /// Must be called from within a tokio runtime, the expiry runs as a task
    pub fn show(&self, kind: NotificationKind, message: impl Into<String>) {
        let expires_at = Instant::now() + self.ttl;
        let message = message.into();
        debug!("Showing {:?} notification: {}", kind, &message);

        self.sender
            .send_replace(NotificationState::shown(kind, message, expires_at));

        let sender = self.sender.clone();
        let expiry = tokio::spawn(async move {
            sleep_until(expires_at).await;
            sender.send_if_modified(|state| {
                if state.visible && state.expires_at == Some(expires_at) {
                    *state = state.clone().hidden();
                    true
                } else {
                    false
                }
            });
        });

        self.replace_timer(Some(expiry));
    }

    pub fn show_outcome(&self, success: bool) {
        if success {
            self.show(NotificationKind::Success, SUCCESS_MESSAGE);
        } else {
            self.show(NotificationKind::Danger, DANGER_MESSAGE);
        }
    }

    pub fn dismiss(&self) {
        self.replace_timer(None);
        self.sender.send_if_modified(|state| {
            if state.visible {
                *state = state.clone().hidden();
                true
            } else {
                false
            }
        });
    }

    pub fn current(&self) -> NotificationState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.sender.subscribe()
    }

    fn replace_timer(&self, timer: Option<JoinHandle<()>>) {
        let mut slot = match self.timer.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = std::mem::replace(&mut *slot, timer) {
            previous.abort();
        }
    }
}

impl Drop for NotificationController {
    fn drop(&mut self) {
        self.replace_timer(None);
    }
}
