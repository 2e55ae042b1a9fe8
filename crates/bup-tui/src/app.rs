//! Application state and key handling

use bup_core::auth::AuthService;
use bup_core::gate::{LoadingOverlay, ModuleGate};
use bup_core::refresh::{RefreshCoordinator, VisibilityFlag};
use bup_core::state::{self, SharedState};
use bup_core::theme::SystemTheme;
use bup_core::views::StandardViews;
use bup_core::{
    AppEvent, AppState, Config, Error, EventBus, Issue, IssueService, IssueTransport, Location,
    Modal, Notifier, Priority, Section, StagedImage, Status, Storage, ThemeManager,
    ThemePreference, Toast, ToastQueue,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};

/// Everything that must report before the application starts
pub const MODULES: [&str; 6] = ["config", "storage", "session", "theme", "views", "refresh"];

#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    Quit,
    Up,
    Down,
    Left,
    Right,
    Enter,
    Tab,
    BackTab,
    Escape,
    Backspace,
    Resend,
    Char(char),
    Noop,
}

pub fn parse_key_action(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Resend,
        KeyCode::Up => KeyAction::Up,
        KeyCode::Down => KeyAction::Down,
        KeyCode::Left => KeyAction::Left,
        KeyCode::Right => KeyAction::Right,
        KeyCode::Enter => KeyAction::Enter,
        KeyCode::Tab => KeyAction::Tab,
        KeyCode::BackTab => KeyAction::BackTab,
        KeyCode::Esc => KeyAction::Escape,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Char(c) => KeyAction::Char(c),
        _ => KeyAction::Noop,
    }
}

/// Results of background work that touch UI-owned state
#[derive(Debug)]
pub enum AppMessage {
    Bootstrap,
    Submitted { ok: bool },
    CodeSent { ok: bool },
    Verified { ok: bool, name: Option<String> },
    ChatReply(Result<String, String>),
}

/// Loading screen; fades once the gate opens
#[derive(Default)]
pub struct Splash {
    hide_at: Mutex<Option<Instant>>,
}

impl Splash {
    pub fn is_visible(&self) -> bool {
        match *self.hide_at.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(at) => Instant::now() < at,
            None => true,
        }
    }
}

impl LoadingOverlay for Splash {
    fn dismiss(&self, fade: Duration) {
        *self.hide_at.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now() + fade);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Category,
    Priority,
    Building,
    Floor,
    Room,
    Description,
    Image,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::Category,
        FormField::Priority,
        FormField::Building,
        FormField::Floor,
        FormField::Room,
        FormField::Description,
        FormField::Image,
    ];

    fn step(self, forward: bool) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let len = Self::ORDER.len();
        let next = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        Self::ORDER[next]
    }
}

/// Buffers of the submit modal
#[derive(Debug, Clone)]
pub struct SubmitForm {
    pub category: String,
    pub priority: Priority,
    pub building: String,
    pub floor: String,
    pub room: String,
    pub description: String,
    pub image_path: String,
    pub images: Vec<StagedImage>,
    pub field: FormField,
    pub sending: bool,
}

impl Default for SubmitForm {
    fn default() -> Self {
        Self {
            category: String::new(),
            priority: Priority::Medium,
            building: String::new(),
            floor: String::new(),
            room: String::new(),
            description: String::new(),
            image_path: String::new(),
            images: Vec::new(),
            field: FormField::Category,
            sending: false,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

impl SubmitForm {
    fn buffer(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Category => Some(&mut self.category),
            FormField::Building => Some(&mut self.building),
            FormField::Floor => Some(&mut self.floor),
            FormField::Room => Some(&mut self.room),
            FormField::Description => Some(&mut self.description),
            FormField::Image => Some(&mut self.image_path),
            FormField::Priority => None,
        }
    }

    fn cycle_priority(&mut self, forward: bool) {
        let all = Priority::ALL;
        let idx = all.iter().position(|p| *p == self.priority).unwrap_or(0);
        let len = all.len();
        self.priority = all[if forward { (idx + 1) % len } else { (idx + len - 1) % len }];
    }

    /// Stage the file named in the image field
    pub fn stage_image(&mut self) -> bup_core::Result<()> {
        let path = self.image_path.trim().to_string();
        if path.is_empty() {
            return Ok(());
        }
        let image = StagedImage::from_path(Path::new(&path))?;
        self.images.push(image);
        self.image_path.clear();
        Ok(())
    }

    pub fn write_draft(&self, draft: &mut bup_core::IssueDraft) {
        draft.category = self.category.trim().to_string();
        draft.priority = self.priority;
        draft.location = Location {
            building: non_empty(&self.building),
            floor: non_empty(&self.floor),
            room: non_empty(&self.room),
        };
        draft.description = self.description.trim().to_string();
        draft.images = self.images.clone();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Default)]
pub struct ChatPanel {
    pub input: String,
    pub transcript: Vec<(Speaker, String)>,
    pub editing: bool,
    pub waiting: bool,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub code: String,
    pub busy: bool,
}

pub struct App {
    pub config: Config,
    pub state: SharedState,
    pub views: StandardViews,
    pub issues: Arc<IssueService>,
    pub auth: Arc<AuthService>,
    pub transport: Arc<dyn IssueTransport>,
    pub theme: ThemeManager,
    pub toasts: Arc<ToastQueue>,
    pub refresh: Arc<RefreshCoordinator>,
    pub visibility: Arc<VisibilityFlag>,
    pub gate: ModuleGate,
    pub splash: Arc<Splash>,
    pub events: EventBus,
    events_rx: broadcast::Receiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppMessage>,
    rx: mpsc::UnboundedReceiver<AppMessage>,

    pub selected: HashMap<Section, usize>,
    pub detail: Option<Issue>,
    pub searching: bool,
    pub form: SubmitForm,
    pub login: LoginForm,
    pub chat: ChatPanel,
    pub ticks: u64,
}

impl App {
    pub fn new(
        config: Config,
        storage: Arc<Storage>,
        transport: Arc<dyn IssueTransport>,
        system: Arc<dyn SystemTheme>,
        start: Section,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let splash = Arc::new(Splash::default());
        let bootstrap_tx = tx.clone();
        let mut gate = ModuleGate::new(MODULES, config.loader_fade(), splash.clone(), move || {
            let _ = bootstrap_tx.send(AppMessage::Bootstrap);
        });
        gate.register("config");
        gate.register("storage");

        let mut app_state = AppState::default();
        app_state.ui.switch_section(start);
        let state = app_state.into_shared();
        let auth = Arc::new(AuthService::new(transport.clone(), storage.clone(), state.clone()));
        if let Some(session) = auth.restore() {
            tracing::info!(user = %session.user.email, "session restored");
        }
        gate.register("session");

        let events = EventBus::new();
        let events_rx = events.subscribe();
        let theme = ThemeManager::load(storage, system, events.clone());
        gate.register("theme");

        let toasts = Arc::new(ToastQueue::new(config.toast_duration()));
        let views = StandardViews::new();
        let issues = Arc::new(IssueService::new(
            transport.clone(),
            state.clone(),
            views.registry(),
            toasts.clone(),
            events.clone(),
        ));
        gate.register("views");

        let visibility = Arc::new(VisibilityFlag::new(true));
        let refresh = Arc::new(RefreshCoordinator::new(
            issues.clone(),
            visibility.clone(),
            toasts.clone(),
            config.refresh_interval(),
        ));
        gate.register("refresh");

        Self {
            config,
            state,
            views,
            issues,
            auth,
            transport,
            theme,
            toasts,
            refresh,
            visibility,
            gate,
            splash,
            events,
            events_rx,
            tx,
            rx,
            selected: HashMap::new(),
            detail: None,
            searching: false,
            form: SubmitForm::default(),
            login: LoginForm::default(),
            chat: ChatPanel::default(),
            ticks: 0,
        }
    }

    pub fn section(&self) -> Section {
        state::read(&self.state).ui.current_section()
    }

    pub fn top_modal(&self) -> Option<Modal> {
        state::read(&self.state).ui.top_modal()
    }

    /// Rows of the list shown in `section`
    pub fn rows(&self, section: Section) -> Vec<Issue> {
        match section {
            Section::Home => self.views.home.snapshot(),
            Section::Moderator => self.views.moderator.snapshot(),
            Section::Schedule => self.views.schedule.snapshot(),
            _ => Vec::new(),
        }
    }

    pub fn selected_index(&self, section: Section) -> usize {
        self.selected.get(&section).copied().unwrap_or(0)
    }

    fn selected_issue(&self) -> Option<Issue> {
        let section = self.section();
        self.rows(section).into_iter().nth(self.selected_index(section))
    }

    fn move_selection(&mut self, down: bool) {
        let section = self.section();
        let len = self.rows(section).len();
        let entry = self.selected.entry(section).or_insert(0);
        if down {
            if *entry + 1 < len {
                *entry += 1;
            }
        } else {
            *entry = entry.saturating_sub(1);
        }
    }

    fn clamp_selection(&mut self) {
        for section in [Section::Home, Section::Moderator, Section::Schedule] {
            let len = self.rows(section).len();
            if let Some(idx) = self.selected.get_mut(&section) {
                *idx = (*idx).min(len.saturating_sub(1));
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.session().is_some()
    }

    fn show(&self, modal: Modal) {
        state::write(&self.state).ui.show(modal);
    }

    fn pop_modal(&self) {
        state::write(&self.state).ui.pop();
    }

    fn info(&self, message: impl Into<String>) {
        self.toasts.notify(Toast::info(message));
    }

    fn error(&self, message: impl Into<String>) {
        self.toasts.notify(Toast::error(message));
    }

    pub fn switch_section(&mut self, section: Section) {
        let previous = state::write(&self.state).ui.switch_section(section);
        self.searching = false;
        self.chat.editing = false;
        if previous == section {
            return;
        }

        self.issues.render_section(section);
        self.events.emit(AppEvent::SectionChanged(section));

        if section == Section::Schedule && self.is_logged_in() {
            let issues = self.issues.clone();
            let toasts = self.toasts.clone();
            tokio::spawn(async move {
                if let Err(e) = issues.load_schedule().await {
                    toasts.notify(Toast::error(e.user_message()));
                }
            });
        }
    }

    /// Handle a key; true means quit
    pub fn handle_key_action(&mut self, action: KeyAction) -> bool {
        if action == KeyAction::Quit {
            return true;
        }

        match self.top_modal() {
            Some(Modal::SubmitIssue) => self.handle_submit_modal(action),
            Some(Modal::Login) => self.handle_login_modal(action),
            Some(Modal::Otp) => self.handle_otp_modal(action),
            Some(Modal::Theme) => self.handle_theme_modal(action),
            Some(Modal::Help) | Some(Modal::IssueDetails) => {
                if matches!(
                    action,
                    KeyAction::Escape | KeyAction::Enter | KeyAction::Char('q')
                ) {
                    self.pop_modal();
                }
            }
            None if self.searching => self.handle_search(action),
            None if self.chat.editing => self.handle_chat_input(action),
            None => return self.handle_normal(action),
        }
        false
    }

    fn handle_normal(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Char('q') => return true,
            KeyAction::Tab | KeyAction::Right | KeyAction::Char('l') => {
                self.switch_section(self.section().next())
            }
            KeyAction::BackTab | KeyAction::Left | KeyAction::Char('h') => {
                self.switch_section(self.section().previous())
            }
            KeyAction::Char(c @ '1'..='6') => {
                let idx = (c as usize) - ('1' as usize);
                self.switch_section(Section::ALL[idx]);
            }
            KeyAction::Down | KeyAction::Char('j') => self.move_selection(true),
            KeyAction::Up | KeyAction::Char('k') => self.move_selection(false),
            KeyAction::Enter => {
                if self.section() == Section::Chat {
                    self.chat.editing = true;
                } else if let Some(issue) = self.selected_issue() {
                    self.detail = Some(issue);
                    self.show(Modal::IssueDetails);
                }
            }
            KeyAction::Char('i') if self.section() == Section::Chat => self.chat.editing = true,
            KeyAction::Char('n') => {
                self.form.field = FormField::Category;
                self.show(Modal::SubmitIssue);
            }
            KeyAction::Char('r') => self.trigger_refresh(),
            KeyAction::Char('t') => self.show(Modal::Theme),
            KeyAction::Char('?') => self.show(Modal::Help),
            KeyAction::Char('L') => {
                if self.is_logged_in() {
                    self.info("Already logged in, press O to log out");
                } else {
                    self.show(Modal::Login);
                }
            }
            KeyAction::Char('O') => self.logout(),
            KeyAction::Char('/') if self.section() == Section::Home => self.searching = true,
            KeyAction::Char('f') if self.section() == Section::Home => self.cycle_status_filter(),
            KeyAction::Char('p') if self.section() == Section::Home => {
                self.cycle_priority_filter()
            }
            KeyAction::Char('x') if self.section() == Section::Home => {
                state::write(&self.state).filter.reset();
                self.rerender_home();
            }
            _ => {}
        }
        false
    }

    fn trigger_refresh(&self) {
        let refresh = self.refresh.clone();
        tokio::spawn(async move {
            let outcome = refresh.trigger().await;
            tracing::debug!(?outcome, "manual refresh");
        });
    }

    fn logout(&mut self) {
        match self.auth.logout() {
            Ok(()) => {
                state::write(&self.state).schedule.clear();
                self.issues.render_section(Section::Schedule);
                self.info("Logged out");
            }
            Err(e) => self.error(e.user_message()),
        }
    }

    fn rerender_home(&mut self) {
        self.issues.render_section(Section::Home);
        self.selected.insert(Section::Home, 0);
    }

    fn cycle_status_filter(&mut self) {
        {
            let mut state = state::write(&self.state);
            let next = match state.filter.status {
                None => Some(Status::ALL[0]),
                Some(current) => Status::ALL
                    .iter()
                    .position(|s| *s == current)
                    .and_then(|i| Status::ALL.get(i + 1))
                    .copied(),
            };
            state.filter.status = next;
        }
        self.rerender_home();
    }

    fn cycle_priority_filter(&mut self) {
        {
            let mut state = state::write(&self.state);
            let next = match state.filter.priority {
                None => Some(Priority::ALL[0]),
                Some(current) => Priority::ALL
                    .iter()
                    .position(|p| *p == current)
                    .and_then(|i| Priority::ALL.get(i + 1))
                    .copied(),
            };
            state.filter.priority = next;
        }
        self.rerender_home();
    }

    fn handle_search(&mut self, action: KeyAction) {
        match action {
            KeyAction::Escape => {
                state::write(&self.state).filter.query.clear();
                self.searching = false;
            }
            KeyAction::Enter => self.searching = false,
            KeyAction::Backspace => {
                state::write(&self.state).filter.query.pop();
            }
            KeyAction::Char(c) => state::write(&self.state).filter.query.push(c),
            _ => return,
        }
        self.rerender_home();
    }

    fn handle_submit_modal(&mut self, action: KeyAction) {
        if self.form.sending {
            return;
        }
        match action {
            KeyAction::Escape => {
                self.pop_modal();
            }
            KeyAction::Tab | KeyAction::Down => self.form.field = self.form.field.step(true),
            KeyAction::BackTab | KeyAction::Up => self.form.field = self.form.field.step(false),
            KeyAction::Left if self.form.field == FormField::Priority => {
                self.form.cycle_priority(false)
            }
            KeyAction::Right if self.form.field == FormField::Priority => {
                self.form.cycle_priority(true)
            }
            KeyAction::Enter if self.form.field == FormField::Image => {
                if let Err(e) = self.form.stage_image() {
                    self.error(format!("Could not read image: {}", e));
                }
            }
            KeyAction::Enter => self.submit(),
            KeyAction::Backspace => {
                // An empty path field unstages the last image
                if self.form.field == FormField::Image && self.form.image_path.is_empty() {
                    self.form.images.pop();
                } else if let Some(buffer) = self.form.buffer() {
                    buffer.pop();
                }
            }
            KeyAction::Char(c) => match self.form.field {
                FormField::Priority => match c {
                    'l' | '+' => self.form.cycle_priority(true),
                    'h' | '-' => self.form.cycle_priority(false),
                    _ => {}
                },
                _ => {
                    if let Some(buffer) = self.form.buffer() {
                        buffer.push(c);
                    }
                }
            },
            _ => {}
        }
    }

    fn submit(&mut self) {
        if self.form.category.trim().is_empty() {
            self.error("Category is required");
            return;
        }

        self.form.write_draft(&mut state::write(&self.state).draft);
        self.form.sending = true;

        let issues = self.issues.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ok = match issues.submit().await {
                Ok(_) => true,
                Err(Error::NotLoggedIn) => false,
                Err(e) => {
                    tracing::warn!("submit failed: {}", e);
                    false
                }
            };
            let _ = tx.send(AppMessage::Submitted { ok });
        });
    }

    fn handle_login_modal(&mut self, action: KeyAction) {
        if self.login.busy {
            return;
        }
        match action {
            KeyAction::Escape => self.pop_modal(),
            KeyAction::Backspace => {
                self.login.email.pop();
            }
            KeyAction::Char(c) => self.login.email.push(c),
            KeyAction::Enter => self.send_code(),
            _ => {}
        }
    }

    fn send_code(&mut self) {
        let email = match bup_core::auth::validate_email(&self.login.email) {
            Ok(email) => email,
            Err(e) => {
                self.error(e.user_message());
                return;
            }
        };

        self.login.busy = true;
        let auth = self.auth.clone();
        let toasts = self.toasts.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let ok = match auth.resend_otp(&email).await {
                Ok(response) => {
                    toasts.notify(Toast::success(
                        response
                            .message
                            .unwrap_or_else(|| format!("Code sent to {}", email)),
                    ));
                    true
                }
                Err(e) => {
                    toasts.notify(Toast::error(e.user_message()));
                    false
                }
            };
            let _ = tx.send(AppMessage::CodeSent { ok });
        });
    }

    fn handle_otp_modal(&mut self, action: KeyAction) {
        if self.login.busy {
            return;
        }
        match action {
            KeyAction::Escape => self.pop_modal(),
            KeyAction::Resend => self.send_code(),
            KeyAction::Backspace => {
                self.login.code.pop();
            }
            KeyAction::Char(c)
                if c.is_ascii_digit() && self.login.code.len() < bup_core::auth::OTP_LENGTH =>
            {
                self.login.code.push(c)
            }
            KeyAction::Enter => self.verify_code(),
            _ => {}
        }
    }

    fn verify_code(&mut self) {
        if let Err(e) = bup_core::auth::validate_otp(&self.login.code) {
            self.error(e.user_message());
            return;
        }

        self.login.busy = true;
        let auth = self.auth.clone();
        let toasts = self.toasts.clone();
        let tx = self.tx.clone();
        let email = self.login.email.clone();
        let code = self.login.code.clone();
        tokio::spawn(async move {
            let message = match auth.verify_otp(&email, &code).await {
                Ok(verification) if verification.is_logged_in() => AppMessage::Verified {
                    ok: true,
                    name: verification.session.map(|s| s.user.name),
                },
                Ok(verification) => {
                    toasts.notify(Toast::error(
                        verification
                            .message
                            .unwrap_or_else(|| "Verification failed".to_string()),
                    ));
                    AppMessage::Verified { ok: false, name: None }
                }
                Err(e) => {
                    toasts.notify(Toast::error(e.user_message()));
                    AppMessage::Verified { ok: false, name: None }
                }
            };
            let _ = tx.send(message);
        });
    }

    fn handle_theme_modal(&mut self, action: KeyAction) {
        let preference = match action {
            KeyAction::Escape | KeyAction::Char('q') => {
                self.pop_modal();
                return;
            }
            KeyAction::Char('1') | KeyAction::Char('l') => ThemePreference::Light,
            KeyAction::Char('2') | KeyAction::Char('d') => ThemePreference::Dark,
            KeyAction::Char('3') | KeyAction::Char('s') => ThemePreference::System,
            KeyAction::Enter | KeyAction::Char(' ') => {
                if let Err(e) = self.theme.cycle() {
                    self.error(e.user_message());
                }
                return;
            }
            _ => return,
        };

        match self.theme.set(preference) {
            Ok(_) => self.pop_modal(),
            Err(e) => self.error(e.user_message()),
        }
    }

    fn handle_chat_input(&mut self, action: KeyAction) {
        match action {
            KeyAction::Escape => self.chat.editing = false,
            KeyAction::Backspace => {
                self.chat.input.pop();
            }
            KeyAction::Char(c) => self.chat.input.push(c),
            KeyAction::Enter => self.send_chat(),
            _ => {}
        }
    }

    fn send_chat(&mut self) {
        let message = self.chat.input.trim().to_string();
        if message.is_empty() || self.chat.waiting {
            return;
        }

        self.chat.transcript.push((Speaker::User, message.clone()));
        self.chat.input.clear();
        self.chat.waiting = true;

        let transport = self.transport.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let reply = transport.chat(&message).await.map_err(|e| e.user_message());
            let _ = tx.send(AppMessage::ChatReply(reply));
        });
    }

    /// Terminal focus doubles as page visibility
    pub fn set_focused(&mut self, focused: bool) {
        self.visibility.set_visible(focused);
        if focused && self.theme.resolved() != self.theme.applied() {
            self.theme.system_changed();
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }

        loop {
            match self.events_rx.try_recv() {
                Ok(AppEvent::DataLoaded { .. }) | Ok(AppEvent::ScheduleLoaded { .. }) => {
                    self.clamp_selection()
                }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::debug!(skipped = n, "event receiver lagged");
                }
                Err(_) => break,
            }
        }

        self.toasts.prune();
    }

    fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Bootstrap => {
                self.refresh.start();
                let issues = self.issues.clone();
                let toasts = self.toasts.clone();
                tokio::spawn(async move {
                    if let Err(e) = issues.fetch().await {
                        tracing::warn!("initial load failed: {}", e);
                        toasts.notify(Toast::error(e.user_message()));
                    }
                });
            }
            AppMessage::Submitted { ok } => {
                self.form.sending = false;
                if ok {
                    self.form = SubmitForm::default();
                    state::write(&self.state).ui.hide(Modal::SubmitIssue);
                }
            }
            AppMessage::CodeSent { ok } => {
                self.login.busy = false;
                if ok {
                    let mut state = state::write(&self.state);
                    state.ui.hide(Modal::Login);
                    state.ui.show(Modal::Otp);
                }
            }
            AppMessage::Verified { ok, name } => {
                self.login.busy = false;
                if ok {
                    self.login = LoginForm::default();
                    state::write(&self.state).ui.hide(Modal::Otp);
                    let greeting = match name {
                        Some(name) => format!("Welcome, {}", name),
                        None => "Logged in".to_string(),
                    };
                    self.toasts.notify(Toast::success(greeting));
                } else {
                    self.login.code.clear();
                }
            }
            AppMessage::ChatReply(reply) => {
                self.chat.waiting = false;
                match reply {
                    Ok(text) => self.chat.transcript.push((Speaker::Assistant, text)),
                    Err(message) => self.error(message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bup_core::transport::{OtpRequest, OtpResponse};
    use bup_core::{NewIssue, ThemeMode};

    #[derive(Default)]
    struct Offline {
        otp: OtpResponse,
    }

    #[async_trait]
    impl IssueTransport for Offline {
        async fn list_issues(&self) -> bup_core::Result<Vec<Issue>> {
            Ok(vec![Issue::new("a", "Plumbing"), Issue::new("b", "Electrical")])
        }
        async fn create_issue(
            &self,
            _issue: &NewIssue,
            _token: Option<&str>,
        ) -> bup_core::Result<Option<Issue>> {
            Ok(None)
        }
        async fn upload_image(&self, image: &StagedImage) -> bup_core::Result<String> {
            Ok(format!("https://cdn.test/{}", image.file_name))
        }
        async fn assigned_to_me(&self, _token: &str) -> bup_core::Result<Vec<Issue>> {
            Ok(Vec::new())
        }
        async fn verify_otp(&self, _request: &OtpRequest) -> bup_core::Result<OtpResponse> {
            Ok(self.otp.clone())
        }
        async fn resend_otp(&self, _request: &OtpRequest) -> bup_core::Result<OtpResponse> {
            Ok(OtpResponse::default())
        }
        async fn chat(&self, message: &str) -> bup_core::Result<String> {
            Ok(format!("you said {}", message))
        }
    }

    struct Dark;

    impl SystemTheme for Dark {
        fn prefers_dark(&self) -> bool {
            true
        }
    }

    fn offline_app(storage: Arc<Storage>) -> App {
        app_with(storage, Offline::default())
    }

    fn app_with(storage: Arc<Storage>, transport: Offline) -> App {
        App::new(
            Config::default(),
            storage,
            Arc::new(transport),
            Arc::new(Dark),
            Section::Home,
        )
    }

    fn press(app: &mut App, keys: &str) {
        for c in keys.chars() {
            app.handle_key_action(KeyAction::Char(c));
        }
    }

    #[test]
    fn test_gate_opens_during_construction() {
        let mut app = offline_app(Arc::new(Storage::in_memory()));
        assert!(app.gate.is_ready());
        assert!(app.gate.pending().is_empty());
        assert!(matches!(app.rx.try_recv(), Ok(AppMessage::Bootstrap)));
        assert!(app.splash.is_visible());
    }

    #[test]
    fn test_splash_hides_after_fade() {
        let splash = Splash::default();
        assert!(splash.is_visible());
        splash.dismiss(Duration::ZERO);
        assert!(!splash.is_visible());
    }

    #[test]
    fn test_modals_stack_and_close() {
        let mut app = offline_app(Arc::new(Storage::in_memory()));
        press(&mut app, "n");
        assert_eq!(app.top_modal(), Some(Modal::SubmitIssue));

        press(&mut app, "Boiler");
        assert_eq!(app.form.category, "Boiler");

        app.handle_key_action(KeyAction::Escape);
        assert_eq!(app.top_modal(), None);

        press(&mut app, "?");
        assert_eq!(app.top_modal(), Some(Modal::Help));
        press(&mut app, "q");
        assert_eq!(app.top_modal(), None);
    }

    #[test]
    fn test_theme_modal_persists_choice() {
        let storage = Arc::new(Storage::in_memory());
        let mut app = offline_app(storage.clone());
        assert_eq!(app.theme.applied(), ThemeMode::Dark);

        press(&mut app, "tl");
        assert_eq!(app.theme.applied(), ThemeMode::Light);
        assert_eq!(app.top_modal(), None);
        assert_eq!(
            storage.get(bup_core::storage::THEME_KEY).as_deref(),
            Some("light")
        );

        let reloaded = offline_app(storage);
        assert_eq!(reloaded.theme.preference(), ThemePreference::Light);
    }

    #[test]
    fn test_form_field_cycle_and_priority() {
        let mut form = SubmitForm::default();
        form.field = FormField::Image;
        assert_eq!(form.field.step(true), FormField::Category);
        assert_eq!(FormField::Category.step(false), FormField::Image);

        form.cycle_priority(true);
        assert_eq!(form.priority, Priority::High);
        form.cycle_priority(false);
        form.cycle_priority(false);
        assert_eq!(form.priority, Priority::Low);
    }

    #[test]
    fn test_write_draft_trims_location() {
        let form = SubmitForm {
            category: " HVAC ".into(),
            building: "Library".into(),
            floor: "  ".into(),
            ..SubmitForm::default()
        };
        let mut draft = bup_core::IssueDraft::default();
        form.write_draft(&mut draft);
        assert_eq!(draft.category, "HVAC");
        assert_eq!(draft.location.building.as_deref(), Some("Library"));
        assert_eq!(draft.location.floor, None);
    }

    #[tokio::test]
    async fn test_section_switch_by_number_closes_modals() {
        let mut app = offline_app(Arc::new(Storage::in_memory()));
        press(&mut app, "?");
        app.handle_key_action(KeyAction::Escape);

        press(&mut app, "3");
        assert_eq!(app.section(), Section::Reports);
        press(&mut app, "t");
        app.switch_section(Section::Home);
        assert_eq!(app.top_modal(), None);
    }

    #[tokio::test]
    async fn test_search_filters_home_list() {
        let mut app = offline_app(Arc::new(Storage::in_memory()));
        app.issues.fetch().await.unwrap();
        assert_eq!(app.rows(Section::Home).len(), 2);

        press(&mut app, "/plumb");
        assert!(app.searching);
        assert_eq!(app.rows(Section::Home).len(), 1);

        app.handle_key_action(KeyAction::Escape);
        assert!(!app.searching);
        assert_eq!(app.rows(Section::Home).len(), 2);
    }

    #[tokio::test]
    async fn test_chat_reply_lands_in_transcript() {
        let mut app = offline_app(Arc::new(Storage::in_memory()));
        app.switch_section(Section::Chat);
        app.handle_key_action(KeyAction::Enter);
        press(&mut app, "hello");
        app.handle_key_action(KeyAction::Enter);
        assert!(app.chat.waiting);

        for _ in 0..50 {
            tokio::task::yield_now().await;
            app.on_tick();
            if !app.chat.waiting {
                break;
            }
        }
        assert_eq!(
            app.chat.transcript,
            vec![
                (Speaker::User, "hello".to_string()),
                (Speaker::Assistant, "you said hello".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_token_without_user_keeps_otp_open() {
        let transport = Offline {
            otp: OtpResponse {
                message: None,
                token: Some("fresh".into()),
                user: None,
            },
        };
        let mut app = app_with(Arc::new(Storage::in_memory()), transport);
        app.login.email = "t@campus.edu".into();
        app.show(Modal::Otp);
        press(&mut app, "123456");
        app.handle_key_action(KeyAction::Enter);
        assert!(app.login.busy);

        for _ in 0..50 {
            tokio::task::yield_now().await;
            app.on_tick();
            if !app.login.busy {
                break;
            }
        }
        assert!(!app.login.busy);
        assert!(!app.is_logged_in());
        assert_eq!(app.top_modal(), Some(Modal::Otp));
        assert!(app.login.code.is_empty());
    }

    #[test]
    fn test_ctrl_keys() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(parse_key_action(ctrl_c), KeyAction::Quit);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(parse_key_action(plain_c), KeyAction::Char('c'));
    }
}
