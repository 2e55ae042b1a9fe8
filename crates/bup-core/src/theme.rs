//! Theme preference: light, dark, or follow the system
//!
//! The preference is persisted under `bup-theme-preference`. `System` is
//! resolved against the OS source every time it is read.

use crate::events::{AppEvent, EventBus};
use crate::storage::{Storage, THEME_KEY};
use crate::Result;
use std::sync::Arc;

/// Stored preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::System,
    ];
}

impl std::str::FromStr for ThemePreference {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" | "auto" => Ok(ThemePreference::System),
            _ => Err(crate::Error::InvalidTheme(s.to_string())),
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemePreference::Light => write!(f, "light"),
            ThemePreference::Dark => write!(f, "dark"),
            ThemePreference::System => write!(f, "system"),
        }
    }
}

/// What is actually displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
        }
    }
}

/// OS-level dark mode query
pub trait SystemTheme: Send + Sync {
    fn prefers_dark(&self) -> bool;
}

/// Reads `BUP_SYSTEM_THEME`, then the terminal's `COLORFGBG`
pub struct EnvSystemTheme;

impl SystemTheme for EnvSystemTheme {
    fn prefers_dark(&self) -> bool {
        let explicit = std::env::var("BUP_SYSTEM_THEME").ok();
        let colorfgbg = std::env::var("COLORFGBG").ok();
        prefers_dark_from(explicit.as_deref(), colorfgbg.as_deref())
    }
}

fn prefers_dark_from(explicit: Option<&str>, colorfgbg: Option<&str>) -> bool {
    if let Some(value) = explicit {
        match value.trim().to_lowercase().as_str() {
            "dark" => return true,
            "light" => return false,
            _ => {}
        }
    }

    // COLORFGBG is "fg;bg" or "fg;default;bg"; low ANSI backgrounds are dark
    colorfgbg
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .map(|bg| bg <= 6 || bg == 8)
        .unwrap_or(true)
}

/// Owns the preference and the applied mode
pub struct ThemeManager {
    storage: Arc<Storage>,
    system: Arc<dyn SystemTheme>,
    events: EventBus,
    preference: ThemePreference,
    applied: ThemeMode,
}

impl ThemeManager {
    /// Read the stored preference and apply it
    pub fn load(storage: Arc<Storage>, system: Arc<dyn SystemTheme>, events: EventBus) -> Self {
        let preference = match storage.get(THEME_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to system", e);
                ThemePreference::System
            }),
            None => ThemePreference::System,
        };

        let mut manager = Self {
            storage,
            system,
            events,
            preference,
            applied: ThemeMode::Dark,
        };
        manager.applied = manager.resolved();
        manager
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    /// Mode currently applied to the display
    pub fn applied(&self) -> ThemeMode {
        self.applied
    }

    /// Resolve the preference now
    pub fn resolved(&self) -> ThemeMode {
        match self.preference {
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
            ThemePreference::System => {
                if self.system.prefers_dark() {
                    ThemeMode::Dark
                } else {
                    ThemeMode::Light
                }
            }
        }
    }

    pub fn is_dark(&self) -> bool {
        self.applied == ThemeMode::Dark
    }

    /// Persist, re-apply and announce a new preference
    pub fn set(&mut self, preference: ThemePreference) -> Result<ThemeMode> {
        self.storage.set(THEME_KEY, preference.to_string())?;
        self.preference = preference;
        let mode = self.apply();
        tracing::info!(%preference, %mode, "theme preference set");
        Ok(mode)
    }

    /// Cycle light → dark → system
    pub fn cycle(&mut self) -> Result<ThemeMode> {
        let next = match self.preference {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::System,
            ThemePreference::System => ThemePreference::Light,
        };
        self.set(next)
    }

    /// OS preference changed; only honoured while following the system
    pub fn system_changed(&mut self) -> Option<ThemeMode> {
        if self.preference != ThemePreference::System {
            return None;
        }
        Some(self.apply())
    }

    fn apply(&mut self) -> ThemeMode {
        self.applied = self.resolved();
        self.events.emit(AppEvent::ThemeChanged(self.applied));
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeOs(AtomicBool);

    impl FakeOs {
        fn new(dark: bool) -> Arc<Self> {
            Arc::new(Self(AtomicBool::new(dark)))
        }

        fn set_dark(&self, dark: bool) {
            self.0.store(dark, Ordering::SeqCst);
        }
    }

    impl SystemTheme for FakeOs {
        fn prefers_dark(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_dark_survives_reload_regardless_of_os() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let os = FakeOs::new(false);

        let storage = Arc::new(Storage::open(&path).unwrap());
        let mut theme = ThemeManager::load(storage, os.clone(), EventBus::new());
        assert_eq!(theme.applied(), ThemeMode::Light);
        theme.set(ThemePreference::Dark).unwrap();

        let reopened = Arc::new(Storage::open(&path).unwrap());
        let mut theme = ThemeManager::load(reopened, os.clone(), EventBus::new());
        assert_eq!(theme.preference(), ThemePreference::Dark);
        assert_eq!(theme.resolved(), ThemeMode::Dark);

        os.set_dark(true);
        os.set_dark(false);
        assert_eq!(theme.system_changed(), None);
        assert_eq!(theme.applied(), ThemeMode::Dark);
    }

    #[test]
    fn test_system_tracks_live_os_changes() {
        let os = FakeOs::new(true);
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut theme = ThemeManager::load(Arc::new(Storage::in_memory()), os.clone(), events);
        assert_eq!(theme.preference(), ThemePreference::System);
        assert!(theme.is_dark());

        os.set_dark(false);
        assert_eq!(theme.system_changed(), Some(ThemeMode::Light));
        assert_eq!(theme.applied(), ThemeMode::Light);
        assert_eq!(rx.try_recv().unwrap(), AppEvent::ThemeChanged(ThemeMode::Light));
    }

    #[test]
    fn test_set_persists_and_emits() {
        let storage = Arc::new(Storage::in_memory());
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let mut theme = ThemeManager::load(storage.clone(), FakeOs::new(true), events);

        theme.set(ThemePreference::Light).unwrap();
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(rx.try_recv().unwrap(), AppEvent::ThemeChanged(ThemeMode::Light));
    }

    #[test]
    fn test_garbage_preference_falls_back_to_system() {
        let storage = Arc::new(Storage::in_memory());
        storage.set(THEME_KEY, "sepia").unwrap();
        let theme = ThemeManager::load(storage, FakeOs::new(false), EventBus::new());
        assert_eq!(theme.preference(), ThemePreference::System);
        assert_eq!(theme.applied(), ThemeMode::Light);
    }

    #[test]
    fn test_cycle_order() {
        let mut theme =
            ThemeManager::load(Arc::new(Storage::in_memory()), FakeOs::new(true), EventBus::new());
        theme.cycle().unwrap();
        assert_eq!(theme.preference(), ThemePreference::Light);
        theme.cycle().unwrap();
        assert_eq!(theme.preference(), ThemePreference::Dark);
        theme.cycle().unwrap();
        assert_eq!(theme.preference(), ThemePreference::System);
    }

    #[test]
    fn test_env_detection() {
        assert!(prefers_dark_from(Some("dark"), Some("0;15")));
        assert!(!prefers_dark_from(Some("light"), None));
        assert!(!prefers_dark_from(None, Some("0;15")));
        assert!(prefers_dark_from(None, Some("15;default;0")));
        assert!(prefers_dark_from(None, None));
    }
}
