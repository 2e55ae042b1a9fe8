//! Application-wide signals other views may listen for

use crate::theme::ThemeMode;
use crate::ui::Section;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The issue collection was replaced
    DataLoaded { count: usize },
    /// The technician schedule was replaced
    ScheduleLoaded { count: usize },
    /// The displayed theme changed
    ThemeChanged(ThemeMode),
    SectionChanged(Section),
}

/// Broadcast channel for [`AppEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Emit to current subscribers; nobody listening is fine
    pub fn emit(&self, event: AppEvent) {
        tracing::debug!(?event, "app event");
        let _ = self.tx.send(event);
    }
}
