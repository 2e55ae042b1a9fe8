//! CLI command implementations

use anyhow::{Result, bail};
use bup_core::filter::IssueFilter;
use bup_core::theme::EnvSystemTheme;
use bup_core::views::{DashboardStats, ReportData, StandardViews};
use bup_core::{
    AppState, AuthService, Config, EventBus, HttpTransport, Issue, IssueDraft, IssueService,
    IssueTransport, Location, Notifier, Priority, Section, SharedState, StagedImage, Status,
    Storage, ThemeManager, Toast, ToastKind,
};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Prints success and info toasts; failures travel back as errors instead
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        match toast.kind {
            ToastKind::Success => println!("{} {}", "✓".green(), toast.message),
            ToastKind::Info => println!("{} {}", "i".blue(), toast.message),
            ToastKind::Error => tracing::debug!("error toast: {}", toast.message),
        }
    }

    fn set_busy(&self, _busy: bool) {}
}

/// Everything a networked command needs
pub struct Client {
    pub config: Config,
    state: SharedState,
    transport: Arc<HttpTransport>,
    issues: Arc<IssueService>,
    auth: AuthService,
    views: StandardViews,
}

impl Client {
    pub fn open() -> Result<Self> {
        let config = Config::load_default()?;
        let storage = Arc::new(open_storage()?);
        let state = AppState::default().into_shared();
        let transport = Arc::new(HttpTransport::new(&config));
        let views = StandardViews::new();

        let issues = Arc::new(IssueService::new(
            transport.clone(),
            state.clone(),
            views.registry(),
            Arc::new(ConsoleNotifier),
            EventBus::new(),
        ));
        let auth = AuthService::new(transport.clone(), storage, state.clone());
        auth.restore();

        Ok(Self {
            config,
            state,
            transport,
            issues,
            auth,
            views,
        })
    }
}

pub fn open_storage() -> Result<Storage> {
    Ok(Storage::open_default()?)
}

/// Service errors carry their user-facing text to the top level
fn user_error(error: bup_core::Error) -> anyhow::Error {
    anyhow::anyhow!(error.user_message())
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Reported")]
    reported: String,
}

impl IssueRow {
    fn new(issue: &Issue, config: &Config) -> Self {
        Self {
            id: issue.id.clone(),
            status: issue.status.label().to_string(),
            priority: issue.priority.to_string(),
            category: issue.category.clone(),
            location: issue.location.to_string(),
            description: truncate(&issue.description, config.display.max_description_length),
            reported: issue
                .created_at
                .format(&config.display.date_format)
                .to_string(),
        }
    }
}

#[derive(Tabled)]
struct VisitRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Issue> for VisitRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id.clone(),
            date: issue
                .scheduled_on()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            time: issue
                .scheduled_at()
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            category: issue.category.clone(),
            location: issue.location.to_string(),
            status: issue.status.label().to_string(),
        }
    }
}

fn print_table<T: Tabled>(rows: Vec<T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
}

pub fn build_filter(
    status: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    query: Option<String>,
) -> Result<IssueFilter> {
    Ok(IssueFilter {
        status: status.map(|s| s.parse::<Status>()).transpose()?,
        category: category.filter(|c| !c.trim().is_empty()),
        priority: priority.map(|p| p.parse::<Priority>()).transpose()?,
        query: query.unwrap_or_default(),
    })
}

pub fn build_draft(
    category: String,
    priority: &str,
    building: Option<String>,
    floor: Option<String>,
    room: Option<String>,
    description: Option<String>,
    images: &[PathBuf],
) -> Result<IssueDraft> {
    if category.trim().is_empty() {
        bail!("Category is required");
    }

    let images = images
        .iter()
        .map(|path| {
            StagedImage::from_path(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(IssueDraft {
        category,
        priority: priority.parse()?,
        location: Location {
            building,
            floor,
            room,
        },
        description: description.unwrap_or_default(),
        images,
    })
}

pub async fn list(client: &Client, filter: IssueFilter, open: bool, json: bool) -> Result<()> {
    bup_core::state::write(&client.state).filter = filter;
    client.issues.fetch().await.map_err(user_error)?;

    let mut issues = client.views.home.snapshot();
    if open {
        issues.retain(Issue::is_open);
    }

    if json {
        println!("{}", serde_json::to_string(&issues)?);
    } else if issues.is_empty() {
        println!("No issues found");
    } else {
        let count = issues.len();
        print_table(
            issues
                .iter()
                .map(|i| IssueRow::new(i, &client.config))
                .collect(),
        );
        println!("{} issue(s)", count);
    }

    Ok(())
}

pub async fn show(client: &Client, id: &str, json: bool) -> Result<()> {
    client.issues.fetch().await.map_err(user_error)?;
    let issue = bup_core::state::read(&client.state)
        .issues
        .iter()
        .find(|i| i.id == id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Issue not found: {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&issue)?);
        return Ok(());
    }

    let status = match issue.status {
        Status::PendingReview => issue.status.label().yellow(),
        Status::Scheduled => issue.status.label().cyan(),
        Status::InProgress => issue.status.label().blue(),
        Status::Completed => issue.status.label().green(),
        Status::Rejected => issue.status.label().dimmed(),
    };

    println!("{} {}", issue.id.cyan().bold(), issue.category.bold());
    println!();
    println!("Status:    {}", status);
    println!("Priority:  {}", issue.priority);
    println!("Location:  {}", issue.location);
    println!(
        "Reported:  {}",
        issue.created_at.format(&client.config.display.date_format)
    );
    if let Some(ref by) = issue.submitted_by {
        println!("By:        {}", by.display_name());
    }
    if let Some(date) = issue.scheduled_on() {
        let time = issue
            .scheduled_at()
            .map(|t| format!(" {}", t.format("%H:%M")))
            .unwrap_or_default();
        println!("Visit:     {}{}", date, time);
    }
    if let Some(ref tech) = issue.assigned_to {
        println!("Assigned:  {}", tech.display_name());
    }

    if !issue.description.is_empty() {
        println!();
        println!("{}", "Description:".bold());
        println!("{}", issue.description);
    }

    if !issue.images.is_empty() {
        println!();
        println!("{}", "Images:".bold());
        for url in &issue.images {
            println!("  {}", url);
        }
    }

    Ok(())
}

pub async fn submit(client: &Client, draft: IssueDraft, json: bool) -> Result<()> {
    if client.auth.session().is_none() {
        bail!("Please log in to submit an issue (bup otp verify <email> <code>)");
    }

    let image_count = draft.images.len();
    bup_core::state::write(&client.state).draft = draft;
    let created = client.issues.submit().await.map_err(user_error)?;

    if json {
        match created {
            Some(issue) => println!("{}", serde_json::to_string(&issue)?),
            None => println!("{}", serde_json::json!({ "submitted": true })),
        }
    } else {
        if let Some(issue) = created {
            println!("  ID: {}", issue.id.cyan());
        }
        if image_count > 0 {
            println!("  Images: {}", image_count);
        }
    }

    Ok(())
}

pub async fn assigned(client: &Client, json: bool) -> Result<()> {
    client.issues.load_schedule().await.map_err(user_error)?;
    let visits = client.views.schedule.snapshot();

    if json {
        println!("{}", serde_json::to_string(&visits)?);
    } else if visits.is_empty() {
        println!("Nothing assigned to you");
    } else {
        print_table(visits.iter().map(VisitRow::from).collect());
    }

    Ok(())
}

pub async fn stats(client: &Client, json: bool) -> Result<()> {
    client.issues.fetch().await.map_err(user_error)?;
    client.issues.render_section(Section::Dashboard);
    client.issues.render_section(Section::Reports);
    let dashboard = client.views.dashboard.snapshot();
    let reports = client.views.reports.snapshot();

    if json {
        println!("{}", stats_json(&dashboard, &reports));
        return Ok(());
    }

    println!("{}", "Dashboard".bold());
    println!("  Total:        {}", dashboard.total);
    println!("  Open:         {}", dashboard.open);
    println!("  Urgent open:  {}", dashboard.urgent_open.to_string().red());
    for (status, count) in &dashboard.by_status {
        println!("  {:<13} {}", format!("{}:", status.label()), count);
    }

    println!();
    println!("{}", "By category".bold());
    for (category, count) in &reports.by_category {
        println!("  {:<13} {}", format!("{}:", category), count);
    }

    println!();
    println!("{}", "By priority".bold());
    for (priority, count) in &reports.by_priority {
        println!("  {:<13} {}", format!("{}:", priority), count);
    }

    println!();
    println!("Resolution rate: {:.0}%", reports.resolution_rate * 100.0);
    Ok(())
}

fn stats_json(dashboard: &DashboardStats, reports: &ReportData) -> serde_json::Value {
    let by_status: serde_json::Map<String, serde_json::Value> = dashboard
        .by_status
        .iter()
        .map(|(s, n)| (s.to_string(), (*n).into()))
        .collect();
    let by_category: serde_json::Map<String, serde_json::Value> = reports
        .by_category
        .iter()
        .map(|(c, n)| (c.clone(), (*n).into()))
        .collect();
    let by_priority: serde_json::Map<String, serde_json::Value> = reports
        .by_priority
        .iter()
        .map(|(p, n)| (p.to_string(), (*n).into()))
        .collect();

    serde_json::json!({
        "total": dashboard.total,
        "open": dashboard.open,
        "urgent_open": dashboard.urgent_open,
        "by_status": by_status,
        "by_category": by_category,
        "by_priority": by_priority,
        "resolution_rate": reports.resolution_rate,
    })
}

pub async fn otp_verify(client: &Client, email: &str, code: &str, json: bool) -> Result<()> {
    let verification = client
        .auth
        .verify_otp(email, code)
        .await
        .map_err(user_error)?;

    if json {
        let user = verification.session.as_ref().map(|s| {
            let u = &s.user;
            serde_json::json!({ "id": u.id, "name": u.name, "email": u.email, "role": u.role })
        });
        println!(
            "{}",
            serde_json::json!({ "message": verification.message, "logged_in": verification.is_logged_in(), "user": user })
        );
        return Ok(());
    }

    match verification.session {
        Some(session) => {
            println!(
                "{} Logged in as {} <{}>",
                "✓".green(),
                session.user.name,
                session.user.email
            );
        }
        None => println!(
            "{}",
            verification
                .message
                .unwrap_or_else(|| "Verification did not return a session".to_string())
        ),
    }
    Ok(())
}

pub async fn otp_resend(client: &Client, email: &str) -> Result<()> {
    let response = client.auth.resend_otp(email).await.map_err(user_error)?;
    println!(
        "{} {}",
        "✓".green(),
        response
            .message
            .unwrap_or_else(|| format!("A new code was sent to {}", email.trim()))
    );
    Ok(())
}

pub fn logout(client: &Client) -> Result<()> {
    client.auth.logout()?;
    println!("{} Logged out", "✓".green());
    Ok(())
}

pub fn whoami(client: &Client, json: bool) -> Result<()> {
    let Some(session) = client.auth.session() else {
        if json {
            println!("null");
        } else {
            println!("Not logged in");
        }
        return Ok(());
    };

    let user = &session.user;
    if json {
        println!(
            "{}",
            serde_json::json!({ "id": user.id, "name": user.name, "email": user.email, "role": user.role })
        );
    } else {
        println!("{} <{}>", user.name.bold(), user.email);
        println!("  Role: {}", user.role);
    }
    Ok(())
}

pub fn theme_show(storage: Storage, json: bool) -> Result<()> {
    let manager = ThemeManager::load(Arc::new(storage), Arc::new(EnvSystemTheme), EventBus::new());
    if json {
        println!(
            "{}",
            serde_json::json!({
                "preference": manager.preference().to_string(),
                "mode": manager.applied().to_string(),
            })
        );
    } else {
        println!("Preference: {}", manager.preference());
        println!("Applied:    {}", manager.applied());
    }
    Ok(())
}

pub fn theme_set(storage: Storage, preference: &str, json: bool) -> Result<()> {
    let preference = preference.parse()?;
    let mut manager =
        ThemeManager::load(Arc::new(storage), Arc::new(EnvSystemTheme), EventBus::new());
    let mode = manager.set(preference)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "preference": preference.to_string(), "mode": mode.to_string() })
        );
    } else {
        println!("{} Theme set to {} ({})", "✓".green(), preference, mode);
    }
    Ok(())
}

pub async fn chat(client: &Client, message: &str, json: bool) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Message is required");
    }
    let reply = client.transport.chat(message).await.map_err(user_error)?;

    if json {
        println!("{}", serde_json::json!({ "reply": reply }));
    } else {
        println!("{}", reply);
    }
    Ok(())
}

pub fn config_show(json: bool) -> Result<()> {
    let config = Config::load_default()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("api_base_url = \"{}\"", config.api_base_url);
        println!("chat_base_url = \"{}\"", config.chat_base_url);
        println!("refresh_interval_secs = {}", config.refresh_interval_secs);
        println!("loader_fade_ms = {}", config.loader_fade_ms);
        println!("toast_secs = {}", config.toast_secs);
        println!();
        println!("[display]");
        println!("date_format = \"{}\"", config.display.date_format);
        println!(
            "max_description_length = {}",
            config.display.max_description_length
        );
    }

    Ok(())
}

pub fn config_path() -> Result<()> {
    match Config::default_path() {
        Some(path) => println!("{}", path.display()),
        None => bail!("Could not determine config directory"),
    }
    Ok(())
}

pub fn config_init(force: bool) -> Result<()> {
    let path = Config::default_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    write_default_config(&path, force)?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

fn write_default_config(path: &std::path::Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default_with_comments())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_filter_parses_enums() {
        let filter = build_filter(
            Some("in-progress".into()),
            Some("  ".into()),
            Some("urgent".into()),
            None,
        )
        .unwrap();
        assert_eq!(filter.status, Some(Status::InProgress));
        assert_eq!(filter.category, None);
        assert_eq!(filter.priority, Some(Priority::Urgent));

        assert!(build_filter(Some("open".into()), None, None, None).is_err());
    }

    #[test]
    fn test_build_draft_stages_images() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("leak.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff]).unwrap();

        let draft = build_draft(
            "Plumbing".into(),
            "high",
            Some("Library".into()),
            None,
            Some("204".into()),
            None,
            &[path],
        )
        .unwrap();
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.images[0].content_type, "image/jpeg");
        assert_eq!(draft.location.room.as_deref(), Some("204"));

        assert!(build_draft(" ".into(), "high", None, None, None, None, &[]).is_err());
        assert!(build_draft("HVAC".into(), "severe", None, None, None, None, &[]).is_err());
        let aliased = build_draft("HVAC".into(), "Critical", None, None, None, None, &[]).unwrap();
        assert_eq!(aliased.priority, Priority::Urgent);
        assert!(
            build_draft(
                "HVAC".into(),
                "low",
                None,
                None,
                None,
                None,
                &[dir.path().join("missing.png")]
            )
            .is_err()
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a leaking pipe", 8), "a leaki…");
        assert_eq!(truncate("ঘরের আলো নষ্ট", 4), "ঘরে…");
    }

    #[test]
    fn test_default_config_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bup").join("config.toml");

        write_default_config(&path, false).unwrap();
        assert!(write_default_config(&path, false).is_err());
        write_default_config(&path, true).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.refresh_interval_secs, 60);
    }

    #[test]
    fn test_stats_json_shape() {
        let mut issue = Issue::new("1", "Plumbing");
        issue.status = Status::Completed;
        let issues = vec![issue, Issue::new("2", "Plumbing")];

        let value = stats_json(
            &DashboardStats::from_issues(&issues),
            &ReportData::from_issues(&issues),
        );
        assert_eq!(value["total"], 2);
        assert_eq!(value["by_category"]["Plumbing"], 2);
        assert_eq!(value["by_status"]["completed"], 1);
        assert_eq!(value["resolution_rate"], 0.5);
    }
}
