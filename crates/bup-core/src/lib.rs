//! bup-core: Core library for the bup campus facilities issue reporter
//!
//! Holds the issue model, the REST transport, and the client-side
//! coordination shared by the CLI and the terminal UI: module readiness,
//! auto-refresh, section and modal state, and the persisted theme.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod gate;
pub mod issue;
pub mod issues;
pub mod notify;
pub mod refresh;
pub mod session;
pub mod state;
pub mod storage;
pub mod theme;
pub mod transport;
pub mod ui;
pub mod views;

#[cfg(test)]
mod test_support;

pub use auth::AuthService;
pub use config::Config;
pub use error::Error;
pub use events::{AppEvent, EventBus};
pub use gate::{GateOutcome, LoadingOverlay, ModuleGate};
pub use issue::{Issue, IssueDraft, Location, NewIssue, Priority, StagedImage, Status};
pub use issues::IssueService;
pub use notify::{Notifier, Toast, ToastKind, ToastQueue};
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshState, Visibility, VisibilityFlag};
pub use session::{CurrentUser, Session};
pub use state::{AppState, SharedState};
pub use storage::Storage;
pub use theme::{ThemeManager, ThemeMode, ThemePreference};
pub use transport::{HttpTransport, IssueTransport};
pub use ui::{Modal, Section, UiState};

/// Result type for bup operations
pub type Result<T> = std::result::Result<T, Error>;
