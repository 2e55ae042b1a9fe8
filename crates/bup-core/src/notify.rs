//! User-visible notifications (toasts) and the busy indicator

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: ToastKind::Info,
            message: message.into(),
        }
    }
}

/// Sink for notifications and the busy spinner
pub trait Notifier: Send + Sync {
    fn notify(&self, toast: Toast);

    fn set_busy(&self, busy: bool);
}

/// Discards everything
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _toast: Toast) {}

    fn set_busy(&self, _busy: bool) {}
}

struct ToastEntry {
    toast: Toast,
    shown_at: Instant,
}

#[derive(Default)]
struct QueueInner {
    toasts: Vec<ToastEntry>,
    busy: bool,
}

/// In-memory notifier; toasts expire after a fixed time
pub struct ToastQueue {
    ttl: Duration,
    inner: Mutex<QueueInner>,
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Visible toasts, newest first
    pub fn visible(&self) -> Vec<Toast> {
        let inner = self.lock();
        inner
            .toasts
            .iter()
            .rev()
            .filter(|e| e.shown_at.elapsed() <= self.ttl)
            .map(|e| e.toast.clone())
            .collect()
    }

    /// Drop expired toasts
    pub fn prune(&self) {
        let ttl = self.ttl;
        self.lock().toasts.retain(|e| e.shown_at.elapsed() <= ttl);
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, toast: Toast) {
        self.lock().toasts.push(ToastEntry {
            toast,
            shown_at: Instant::now(),
        });
    }

    fn set_busy(&self, busy: bool) {
        self.lock().busy = busy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_busy() {
        let queue = ToastQueue::new(Duration::from_secs(60));
        queue.notify(Toast::info("first"));
        queue.notify(Toast::error("second"));
        queue.set_busy(true);

        let visible = queue.visible();
        assert_eq!(visible[0], Toast::error("second"));
        assert_eq!(visible[1].message, "first");
        assert!(queue.is_busy());
    }

    #[test]
    fn test_expired_toasts_are_hidden() {
        let queue = ToastQueue::new(Duration::ZERO);
        queue.notify(Toast::success("done"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(queue.visible().is_empty());
        queue.prune();
        assert!(queue.lock().toasts.is_empty());
    }
}
