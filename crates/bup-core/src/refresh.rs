//! Auto-refresh coordinator
//!
//! Two states, `Idle` and `Refreshing`, held in one flag. Periodic ticks and
//! manual refreshes both go through [`RefreshCoordinator::refresh`], so at
//! most one refresh is ever in flight; a trigger that finds the flag taken is
//! dropped, never queued.
//!
//! The section to re-render is read when the refresh starts, not when the
//! fetch completes. A section switch during the fetch therefore renders the
//! section the user just left.

use crate::issues::IssueService;
use crate::notify::{Notifier, Toast};
use crate::ui::Section;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed { section: Section, count: usize },
    Failed { message: String },
    /// Another refresh was in flight
    Busy,
    /// Periodic tick while the client was in the background
    Hidden,
}

/// Whether the client is in the foreground
pub trait Visibility: Send + Sync {
    fn is_visible(&self) -> bool;
}

pub struct AlwaysVisible;

impl Visibility for AlwaysVisible {
    fn is_visible(&self) -> bool {
        true
    }
}

/// Visibility toggled by focus events
pub struct VisibilityFlag(AtomicBool);

impl VisibilityFlag {
    pub fn new(visible: bool) -> Self {
        Self(AtomicBool::new(visible))
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.store(visible, Ordering::SeqCst);
    }
}

impl Visibility for VisibilityFlag {
    fn is_visible(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds the busy flag; releasing it (and the spinner) happens on drop, so
/// errors and cancellation both end in `Idle`.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    spinner: Option<&'a dyn Notifier>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, spinner: Option<&'a dyn Notifier>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        if let Some(notifier) = spinner {
            notifier.set_busy(true);
        }
        Some(Self { flag, spinner })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if let Some(notifier) = self.spinner {
            notifier.set_busy(false);
        }
        self.flag.store(false, Ordering::Release);
    }
}

struct Inner {
    service: Arc<IssueService>,
    visibility: Arc<dyn Visibility>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
    busy: AtomicBool,
}

impl Inner {
    async fn refresh(&self, manual: bool) -> RefreshOutcome {
        let spinner = manual.then_some(self.notifier.as_ref());
        let Some(_guard) = BusyGuard::acquire(&self.busy, spinner) else {
            tracing::debug!(manual, "refresh already in flight, dropping trigger");
            return RefreshOutcome::Busy;
        };

        let section = self.service.current_section();
        match self.service.fetch().await {
            Ok(count) => {
                self.service.render_section(section);
                if manual {
                    self.notifier.notify(Toast::success("Data refreshed"));
                }
                tracing::debug!(%section, count, manual, "refresh complete");
                RefreshOutcome::Refreshed { section, count }
            }
            Err(e) => {
                tracing::warn!(manual, "refresh failed: {}", e);
                let message = e.user_message();
                if manual {
                    self.notifier
                        .notify(Toast::error(format!("Refresh failed: {}", message)));
                }
                RefreshOutcome::Failed { message }
            }
        }
    }

    async fn tick(&self) -> RefreshOutcome {
        if !self.visibility.is_visible() {
            return RefreshOutcome::Hidden;
        }
        self.refresh(false).await
    }
}

struct RunningTask {
    shutdown: watch::Sender<bool>,
    _handle: JoinHandle<()>,
}

/// Owns the periodic refresh task
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
    task: Mutex<Option<RunningTask>>,
}

impl RefreshCoordinator {
    pub fn new(
        service: Arc<IssueService>,
        visibility: Arc<dyn Visibility>,
        notifier: Arc<dyn Notifier>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                visibility,
                notifier,
                interval,
                busy: AtomicBool::new(false),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> RefreshState {
        if self.inner.busy.load(Ordering::Acquire) {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Install the periodic trigger; the first tick fires one interval from
    /// now. Must be called inside a Tokio runtime. Starting twice is a no-op.
    pub fn start(&self) {
        let mut task = self.lock_task();
        if task.is_some() {
            return;
        }

        let (shutdown, mut stopped) = watch::channel(false);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + inner.interval, inner.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tokio::select! {
                            outcome = inner.tick() => {
                                tracing::trace!(?outcome, "periodic refresh");
                            }
                            _ = stopped.changed() => break,
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
            tracing::debug!("auto-refresh stopped");
        });

        tracing::debug!(interval = ?self.inner.interval, "auto-refresh started");
        *task = Some(RunningTask {
            shutdown,
            _handle: handle,
        });
    }

    /// Cancel the periodic trigger, dropping a periodic refresh in flight
    pub fn stop(&self) {
        if let Some(running) = self.lock_task().take() {
            let _ = running.shutdown.send(true);
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_task().is_some()
    }

    /// Out-of-band refresh with spinner and notification
    pub async fn trigger(&self) -> RefreshOutcome {
        self.inner.refresh(true).await
    }

    /// Refresh now; `manual` controls spinner and notifications
    pub async fn refresh(&self, manual: bool) -> RefreshOutcome {
        self.inner.refresh(manual).await
    }

    /// One periodic tick: skipped while hidden or busy
    pub async fn tick(&self) -> RefreshOutcome {
        self.inner.tick().await
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<RunningTask>> {
        self.task.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for RefreshCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}
