//! Module readiness gate
//!
//! Holds one loaded flag per named module. When the last flag flips, the
//! application bootstrap runs exactly once and the loading overlay is told to
//! fade out. There is no timeout: a module that never reports keeps the
//! application on the loading screen.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Default fade-out delay of the loading overlay
pub const DEFAULT_FADE: Duration = Duration::from_millis(500);

/// The loading screen shown until bootstrap
pub trait LoadingOverlay: Send + Sync {
    /// Remove the overlay after `fade`
    fn dismiss(&self, fade: Duration);
}

/// Result of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// This registration completed the set; bootstrap ran
    Ready,
    /// Still waiting on other modules
    Pending { remaining: usize },
    /// Module was already loaded
    AlreadyLoaded,
    /// Name is not part of the gate
    Unknown,
}

type Bootstrap = Box<dyn FnOnce() + Send>;

pub struct ModuleGate {
    modules: BTreeMap<String, bool>,
    fade: Duration,
    bootstrap: Option<Bootstrap>,
    overlay: Arc<dyn LoadingOverlay>,
}

impl ModuleGate {
    pub fn new<I, S>(
        names: I,
        fade: Duration,
        overlay: Arc<dyn LoadingOverlay>,
        bootstrap: impl FnOnce() + Send + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: names.into_iter().map(|n| (n.into(), false)).collect(),
            fade,
            bootstrap: Some(Box::new(bootstrap)),
            overlay,
        }
    }

    /// Mark `name` loaded, firing bootstrap if it was the last one
    pub fn register(&mut self, name: &str) -> GateOutcome {
        let Some(loaded) = self.modules.get_mut(name) else {
            tracing::warn!(module = name, "unknown module registered, ignoring");
            return GateOutcome::Unknown;
        };

        if *loaded {
            tracing::debug!(module = name, "module registered twice");
            return GateOutcome::AlreadyLoaded;
        }
        *loaded = true;
        tracing::debug!(module = name, "module loaded");

        let remaining = self.pending().len();
        if remaining > 0 {
            return GateOutcome::Pending { remaining };
        }

        match self.bootstrap.take() {
            Some(bootstrap) => {
                tracing::info!("all modules loaded, starting application");
                bootstrap();
                self.overlay.dismiss(self.fade);
                GateOutcome::Ready
            }
            None => GateOutcome::AlreadyLoaded,
        }
    }

    /// Modules that have not reported yet
    pub fn pending(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(_, loaded)| !**loaded)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.bootstrap.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingOverlay {
        dismissed: Mutex<Vec<Duration>>,
    }

    impl LoadingOverlay for RecordingOverlay {
        fn dismiss(&self, fade: Duration) {
            self.dismissed.lock().unwrap().push(fade);
        }
    }

    fn gate(names: &[&str]) -> (ModuleGate, Arc<AtomicUsize>, Arc<RecordingOverlay>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let overlay = Arc::new(RecordingOverlay::default());
        let counter = fired.clone();
        let gate = ModuleGate::new(names.iter().copied(), DEFAULT_FADE, overlay.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (gate, fired, overlay)
    }

    #[test]
    fn test_fires_once_after_all_modules() {
        let (mut gate, fired, overlay) = gate(&["storage", "theme", "issues"]);

        assert_eq!(gate.register("theme"), GateOutcome::Pending { remaining: 2 });
        assert_eq!(gate.register("storage"), GateOutcome::Pending { remaining: 1 });
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        assert_eq!(gate.register("issues"), GateOutcome::Ready);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(*overlay.dismissed.lock().unwrap(), vec![DEFAULT_FADE]);

        assert_eq!(gate.register("issues"), GateOutcome::AlreadyLoaded);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(gate.is_ready());
    }

    #[test]
    fn test_unknown_module_does_not_count() {
        let (mut gate, fired, _) = gate(&["storage", "theme"]);

        assert_eq!(gate.register("storage"), GateOutcome::Pending { remaining: 1 });
        assert_eq!(gate.register("charts"), GateOutcome::Unknown);
        assert_eq!(gate.register("charts"), GateOutcome::Unknown);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(gate.pending(), vec!["theme"]);
    }

    #[test]
    fn test_missing_module_never_bootstraps() {
        let (mut gate, fired, overlay) = gate(&["storage", "theme", "issues"]);
        gate.register("storage");
        gate.register("theme");
        gate.register("theme");

        assert!(!gate.is_ready());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(overlay.dismissed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_before_completion_is_noop() {
        let (mut gate, _, _) = gate(&["a", "b"]);
        gate.register("a");
        assert_eq!(gate.register("a"), GateOutcome::AlreadyLoaded);
        assert_eq!(gate.pending(), vec!["b"]);
    }
}
