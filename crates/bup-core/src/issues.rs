//! Issue fetch and submission

use crate::events::{AppEvent, EventBus};
use crate::issue::Issue;
use crate::notify::{Notifier, Toast};
use crate::state::{self, SharedState};
use crate::transport::IssueTransport;
use crate::ui::{Modal, Section};
use crate::views::{RenderContext, ViewRegistry};
use crate::{Error, Result};
use std::sync::Arc;

pub struct IssueService {
    transport: Arc<dyn IssueTransport>,
    state: SharedState,
    views: ViewRegistry,
    notifier: Arc<dyn Notifier>,
    events: EventBus,
}

impl IssueService {
    pub fn new(
        transport: Arc<dyn IssueTransport>,
        state: SharedState,
        views: ViewRegistry,
        notifier: Arc<dyn Notifier>,
        events: EventBus,
    ) -> Self {
        Self {
            transport,
            state,
            views,
            notifier,
            events,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn current_section(&self) -> Section {
        state::read(&self.state).ui.current_section()
    }

    /// Replace the whole collection from the backend
    ///
    /// Re-renders the home list and the map overlay, then broadcasts
    /// [`AppEvent::DataLoaded`].
    pub async fn fetch(&self) -> Result<usize> {
        let issues = self.transport.list_issues().await?;
        let count = issues.len();
        tracing::debug!(count, "issues fetched");

        {
            let mut state = state::write(&self.state);
            state.issues = issues;
        }

        {
            let state = state::read(&self.state);
            let ctx = RenderContext {
                issues: &state.issues,
                filter: &state.filter,
                schedule: &state.schedule,
            };
            self.views.render_section(Section::Home, &ctx);
            self.views.render_map(&ctx);
        }

        self.events.emit(AppEvent::DataLoaded { count });
        Ok(count)
    }

    /// Re-render one section from the current collection
    pub fn render_section(&self, section: Section) -> bool {
        let state = state::read(&self.state);
        let ctx = RenderContext {
            issues: &state.issues,
            filter: &state.filter,
            schedule: &state.schedule,
        };
        self.views.render_section(section, &ctx)
    }

    /// Submit the current draft
    ///
    /// Requires a session. Staged images are uploaded one by one before the
    /// record is created, since the record carries their URLs.
    pub async fn submit(&self) -> Result<Option<Issue>> {
        let (session, draft) = {
            let state = state::read(&self.state);
            (state.session.clone(), state.draft.clone())
        };

        let Some(session) = session else {
            self.notifier.notify(Toast::error(Error::NotLoggedIn.user_message()));
            state::write(&self.state).ui.show(Modal::Login);
            return Err(Error::NotLoggedIn);
        };

        let mut urls = Vec::with_capacity(draft.images.len());
        for image in &draft.images {
            match self.transport.upload_image(image).await {
                Ok(url) => urls.push(url),
                Err(e) => return Err(self.report_failure(e)),
            }
        }

        let payload = draft.to_new_issue(Some(session.user.id.clone()), urls);
        let created = match self
            .transport
            .create_issue(&payload, Some(&session.token))
            .await
        {
            Ok(created) => created,
            Err(e) => return Err(self.report_failure(e)),
        };

        let on_home = {
            let mut state = state::write(&self.state);
            state.draft.reset();
            state.ui.current_section() == Section::Home
        };
        tracing::info!(category = %payload.category, "issue submitted");
        self.notifier.notify(Toast::success("Issue submitted successfully"));

        if on_home && let Err(e) = self.fetch().await {
            tracing::warn!("reload after submit failed: {}", e);
        }

        Ok(created)
    }

    /// Load the technician's assigned issues
    pub async fn load_schedule(&self) -> Result<usize> {
        let token = state::read(&self.state)
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(Error::NotLoggedIn)?;

        let schedule = self.transport.assigned_to_me(&token).await?;
        let count = schedule.len();
        state::write(&self.state).schedule = schedule;
        self.render_section(Section::Schedule);
        self.events.emit(AppEvent::ScheduleLoaded { count });
        Ok(count)
    }

    fn report_failure(&self, error: Error) -> Error {
        tracing::warn!("submit failed: {}", error);
        self.notifier.notify(Toast::error(error.user_message()));
        error
    }
}
