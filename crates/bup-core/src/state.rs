//! Application state shared by every view and service
//!
//! Each field has one writer: `issues` is replaced only by
//! [`IssueService::fetch`](crate::issues::IssueService::fetch), `schedule` only
//! by `load_schedule`, `session` only by [`AuthService`](crate::auth::AuthService),
//! and `ui`, `filter` and `draft` only by the front end.

use crate::filter::IssueFilter;
use crate::issue::{Issue, IssueDraft};
use crate::session::Session;
use crate::ui::UiState;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct AppState {
    pub issues: Vec<Issue>,
    pub ui: UiState,
    pub filter: IssueFilter,
    pub draft: IssueDraft,
    pub schedule: Vec<Issue>,
    pub session: Option<Session>,
}

pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }
}

/// Read lock; a poisoned lock still yields the data
pub fn read(state: &SharedState) -> RwLockReadGuard<'_, AppState> {
    state.read().unwrap_or_else(|e| e.into_inner())
}

pub fn write(state: &SharedState) -> RwLockWriteGuard<'_, AppState> {
    state.write().unwrap_or_else(|e| e.into_inner())
}
