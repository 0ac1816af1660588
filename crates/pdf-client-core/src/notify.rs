//! Transient user notifications ("toasts").
//!
//! Any component can post through a cloned [`NotificationCenter`]. Each toast
//! walks through its phases on tokio timers and removes itself; front ends
//! either poll [`NotificationCenter::toasts`] or subscribe to the broadcast of
//! new posts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Delay before a new toast starts its enter transition
pub const ENTER_DELAY: Duration = Duration::from_millis(10);
/// Time from posting until the exit transition starts
pub const DISPLAY_DURATION: Duration = Duration::from_secs(3);
/// Length of the exit transition
pub const EXIT_DURATION: Duration = Duration::from_millis(300);

const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Success => "✔",
            Self::Warning => "⚠",
            Self::Error => "✖",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    /// Inserted, enter transition not yet applied
    Entering,
    Visible,
    /// Exit transition running, removal pending
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub phase: ToastPhase,
}

/// Broadcast to subscribers when a toast is posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
}

struct Inner {
    toasts: Mutex<Vec<Toast>>,
    next_id: AtomicU64,
    events: broadcast::Sender<Notification>,
}

impl Inner {
    fn set_phase(&self, id: ToastId, phase: ToastPhase) {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(toast) = toasts.iter_mut().find(|t| t.id == id) {
            toast.phase = phase;
        }
    }

    fn remove(&self, id: ToastId) {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|t| t.id != id);
    }
}

/// Shared handle to the active toasts
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                toasts: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                events,
            }),
        }
    }

    /// Show a message. Toasts stack; identical messages are not merged.
    ///
    /// Outside a tokio runtime the toast is still recorded and broadcast but
    /// never expires.
    pub fn post(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        let message = message.into();
        let id = ToastId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));

        match severity {
            Severity::Error => error!("{}", message),
            Severity::Warning => warn!("{}", message),
            Severity::Info | Severity::Success => info!("{}", message),
        }

        {
            let mut toasts = self.inner.toasts.lock().unwrap_or_else(PoisonError::into_inner);
            toasts.push(Toast {
                id,
                message: message.clone(),
                severity,
                phase: ToastPhase::Entering,
            });
        }

        // No receivers is fine
        let _ = self.inner.events.send(Notification {
            id,
            message,
            severity,
        });

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(run_lifecycle(Arc::clone(&self.inner), id));
            }
            Err(_) => debug!("No runtime, toast {:?} will not expire", id),
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.post(message, Severity::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.post(message, Severity::Success)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.post(message, Severity::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.post(message, Severity::Error)
    }

    /// Snapshot of the toasts currently on screen, oldest first
    pub fn toasts(&self) -> Vec<Toast> {
        self.inner
            .toasts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.events.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_lifecycle(inner: Arc<Inner>, id: ToastId) {
    let posted = Instant::now();

    tokio::time::sleep_until(posted + ENTER_DELAY).await;
    inner.set_phase(id, ToastPhase::Visible);

    tokio::time::sleep_until(posted + DISPLAY_DURATION).await;
    inner.set_phase(id, ToastPhase::Leaving);

    tokio::time::sleep_until(posted + DISPLAY_DURATION + EXIT_DURATION).await;
    inner.remove(id);
}
