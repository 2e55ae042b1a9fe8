//! In-memory doubles shared by the service tests

use crate::events::EventBus;
use crate::issue::{Issue, Location, NewIssue, Priority, StagedImage, Status};
use crate::issues::IssueService;
use crate::notify::{Notifier, Toast};
use crate::session::{CurrentUser, Session};
use crate::state::{AppState, SharedState};
use crate::transport::{IssueTransport, OtpRequest, OtpResponse};
use crate::views::{RenderContext, View, ViewRegistry};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Parks the next `list_issues` call until released
#[derive(Clone, Default)]
pub struct ListHold {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ListHold {
    /// Wait until the held call has started
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Default)]
struct MockInner {
    issues: Vec<Issue>,
    calls: Vec<String>,
    fail_list: bool,
    fail_upload: bool,
    create_error: Option<(u16, String)>,
    last_created: Option<NewIssue>,
    last_token: Option<String>,
    otp_response: OtpResponse,
    hold: Option<ListHold>,
}

/// Transport that records every call
pub struct MockTransport {
    inner: Mutex<MockInner>,
}

impl MockTransport {
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Arc<Self> {
        Self::with_issues(Vec::new())
    }

    pub fn with_issues(issues: Vec<Issue>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(MockInner {
                issues,
                ..MockInner::default()
            }),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.inner).calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        lock(&self.inner).calls.iter().filter(|c| *c == call).count()
    }

    pub fn fail_list(&self, fail: bool) {
        lock(&self.inner).fail_list = fail;
    }

    pub fn fail_upload(&self, fail: bool) {
        lock(&self.inner).fail_upload = fail;
    }

    pub fn fail_create(&self, status: u16, message: &str) {
        lock(&self.inner).create_error = Some((status, message.to_string()));
    }

    pub fn set_otp_response(&self, response: OtpResponse) {
        lock(&self.inner).otp_response = response;
    }

    pub fn last_created(&self) -> Option<NewIssue> {
        lock(&self.inner).last_created.clone()
    }

    pub fn last_token(&self) -> Option<String> {
        lock(&self.inner).last_token.clone()
    }

    /// Hold the next list call open
    pub fn hold_list(&self) -> ListHold {
        let hold = ListHold::default();
        lock(&self.inner).hold = Some(hold.clone());
        hold
    }

    fn record(&self, call: impl Into<String>) {
        lock(&self.inner).calls.push(call.into());
    }
}

#[async_trait]
impl IssueTransport for MockTransport {
    async fn list_issues(&self) -> Result<Vec<Issue>> {
        self.record("list");
        let hold = lock(&self.inner).hold.take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        let inner = lock(&self.inner);
        if inner.fail_list {
            return Err(Error::Api {
                status: 500,
                message: "Failed to load issues".into(),
            });
        }
        Ok(inner.issues.clone())
    }

    async fn create_issue(&self, issue: &NewIssue, token: Option<&str>) -> Result<Option<Issue>> {
        self.record("create");
        let mut inner = lock(&self.inner);
        if let Some((status, message)) = inner.create_error.clone() {
            return Err(Error::Api { status, message });
        }
        inner.last_created = Some(issue.clone());
        inner.last_token = token.map(String::from);
        Ok(None)
    }

    async fn upload_image(&self, image: &StagedImage) -> Result<String> {
        self.record(format!("upload:{}", image.file_name));
        if lock(&self.inner).fail_upload {
            return Err(Error::Api {
                status: 502,
                message: "Image upload failed".into(),
            });
        }
        Ok(format!("https://cdn.test/{}", image.file_name))
    }

    async fn assigned_to_me(&self, _token: &str) -> Result<Vec<Issue>> {
        self.record("assigned");
        Ok(lock(&self.inner).issues.clone())
    }

    async fn verify_otp(&self, _request: &OtpRequest) -> Result<OtpResponse> {
        self.record("verify");
        Ok(lock(&self.inner).otp_response.clone())
    }

    async fn resend_otp(&self, _request: &OtpRequest) -> Result<OtpResponse> {
        self.record("resend");
        Ok(OtpResponse {
            message: Some("OTP sent".into()),
            ..OtpResponse::default()
        })
    }

    async fn chat(&self, message: &str) -> Result<String> {
        self.record("chat");
        Ok(format!("echo: {}", message))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
    busy: Mutex<Vec<bool>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        lock(&self.toasts).clone()
    }

    pub fn busy_changes(&self) -> Vec<bool> {
        lock(&self.busy).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        lock(&self.toasts).push(toast);
    }

    fn set_busy(&self, busy: bool) {
        lock(&self.busy).push(busy);
    }
}

/// Counts renders
#[derive(Default)]
pub struct RecordingView {
    renders: AtomicUsize,
}

impl RecordingView {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl View for RecordingView {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn render(&self, _ctx: &RenderContext<'_>) {
        self.renders.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn service(
    transport: Arc<MockTransport>,
    views: ViewRegistry,
) -> (Arc<IssueService>, SharedState, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let (service, state) = service_with_notifier(transport, views, notifier.clone());
    (service, state, notifier)
}

pub fn service_with_notifier(
    transport: Arc<MockTransport>,
    views: ViewRegistry,
    notifier: Arc<RecordingNotifier>,
) -> (Arc<IssueService>, SharedState) {
    let state = AppState::default().into_shared();
    let service = IssueService::new(transport, state.clone(), views, notifier, EventBus::new());
    (Arc::new(service), state)
}

pub fn logged_in() -> Session {
    Session {
        token: "tok".into(),
        user: CurrentUser {
            id: "u1".into(),
            name: "Nusrat".into(),
            email: "nusrat@campus.edu".into(),
            role: "technician".into(),
        },
    }
}

pub fn sample_issues() -> Vec<Issue> {
    let now = Utc::now();

    let mut leak = Issue::new("i1", "Plumbing");
    leak.priority = Priority::High;
    leak.location = Location {
        building: Some("Library".into()),
        floor: Some("2".into()),
        room: Some("204".into()),
    };
    leak.created_at = now - Duration::hours(3);
    leak.scheduled_date = Some("2026-10-20".into());
    leak.scheduled_time = Some("09:30".into());

    let mut light = Issue::new("i2", "Electrical");
    light.location.building = Some("Science Hall".into());
    light.status = Status::InProgress;
    light.created_at = now - Duration::hours(2);

    let mut chair = Issue::new("i3", "Furniture");
    chair.priority = Priority::Low;
    chair.status = Status::Completed;
    chair.created_at = now - Duration::hours(1);

    vec![leak, light, chair]
}
