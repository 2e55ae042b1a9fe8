//! Views and their render models
//!
//! A view turns the issue collection into whatever its screen displays and
//! keeps the result until the next render. Front ends read the snapshots;
//! services decide when a view re-renders through the [`ViewRegistry`].

use crate::filter::IssueFilter;
use crate::issue::{Issue, Priority, Status};
use crate::ui::Section;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Inputs available to every render
pub struct RenderContext<'a> {
    pub issues: &'a [Issue],
    pub filter: &'a IssueFilter,
    pub schedule: &'a [Issue],
}

pub trait View: Send + Sync {
    fn name(&self) -> &'static str;

    fn render(&self, ctx: &RenderContext<'_>);
}

/// Section → view lookup, built once at startup
#[derive(Clone, Default)]
pub struct ViewRegistry {
    sections: HashMap<Section, Arc<dyn View>>,
    map: Option<Arc<dyn View>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: Section, view: Arc<dyn View>) -> Self {
        self.sections.insert(section, view);
        self
    }

    pub fn with_map(mut self, view: Arc<dyn View>) -> Self {
        self.map = Some(view);
        self
    }

    pub fn view(&self, section: Section) -> Option<&Arc<dyn View>> {
        self.sections.get(&section)
    }

    /// Render the view of `section`; false if none is registered
    pub fn render_section(&self, section: Section, ctx: &RenderContext<'_>) -> bool {
        match self.sections.get(&section) {
            Some(view) => {
                tracing::trace!(view = view.name(), "render");
                view.render(ctx);
                true
            }
            None => false,
        }
    }

    pub fn render_map(&self, ctx: &RenderContext<'_>) {
        if let Some(map) = &self.map {
            map.render(ctx);
        }
    }
}

fn snapshot<T: Clone>(lock: &RwLock<T>) -> T {
    lock.read().unwrap_or_else(|e| e.into_inner()).clone()
}

fn store<T>(lock: &RwLock<T>, value: T) {
    *lock.write().unwrap_or_else(|e| e.into_inner()) = value;
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub open: usize,
    pub urgent_open: usize,
    pub by_status: Vec<(Status, usize)>,
}

impl DashboardStats {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let by_status = Status::ALL
            .iter()
            .map(|s| (*s, issues.iter().filter(|i| i.status == *s).count()))
            .collect();

        Self {
            total: issues.len(),
            open: issues.iter().filter(|i| i.is_open()).count(),
            urgent_open: issues
                .iter()
                .filter(|i| i.is_open() && i.priority == Priority::Urgent)
                .count(),
            by_status,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[derive(Default)]
pub struct DashboardView {
    stats: RwLock<DashboardStats>,
}

impl DashboardView {
    pub fn snapshot(&self) -> DashboardStats {
        snapshot(&self.stats)
    }
}

impl View for DashboardView {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        store(&self.stats, DashboardStats::from_issues(ctx.issues));
    }
}

/// Chart series for the reports screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportData {
    /// Largest category first
    pub by_category: Vec<(String, usize)>,
    pub by_priority: Vec<(Priority, usize)>,
    /// Completed share of all issues, 0.0 to 1.0
    pub resolution_rate: f64,
}

impl ReportData {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        for issue in issues {
            *categories.entry(issue.category.clone()).or_default() += 1;
        }
        let mut by_category: Vec<(String, usize)> = categories.into_iter().collect();
        by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let by_priority = Priority::ALL
            .iter()
            .map(|p| (*p, issues.iter().filter(|i| i.priority == *p).count()))
            .collect();

        let completed = issues
            .iter()
            .filter(|i| i.status == Status::Completed)
            .count();
        let resolution_rate = if issues.is_empty() {
            0.0
        } else {
            completed as f64 / issues.len() as f64
        };

        Self {
            by_category,
            by_priority,
            resolution_rate,
        }
    }
}

#[derive(Default)]
pub struct ReportsView {
    data: RwLock<ReportData>,
}

impl ReportsView {
    pub fn snapshot(&self) -> ReportData {
        snapshot(&self.data)
    }
}

impl View for ReportsView {
    fn name(&self) -> &'static str {
        "reports"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        store(&self.data, ReportData::from_issues(ctx.issues));
    }
}

/// Home list with the active filter applied
#[derive(Default)]
pub struct HomeListView {
    rows: RwLock<Vec<Issue>>,
}

impl HomeListView {
    pub fn snapshot(&self) -> Vec<Issue> {
        snapshot(&self.rows)
    }
}

impl View for HomeListView {
    fn name(&self) -> &'static str {
        "home"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        store(&self.rows, ctx.filter.apply(ctx.issues));
    }
}

/// Review queue: pending issues, oldest first
#[derive(Default)]
pub struct ModeratorView {
    queue: RwLock<Vec<Issue>>,
}

impl ModeratorView {
    pub fn snapshot(&self) -> Vec<Issue> {
        snapshot(&self.queue)
    }
}

impl View for ModeratorView {
    fn name(&self) -> &'static str {
        "moderator"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        let mut queue: Vec<Issue> = ctx
            .issues
            .iter()
            .filter(|i| i.status == Status::PendingReview)
            .cloned()
            .collect();
        queue.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        store(&self.queue, queue);
    }
}

/// Technician schedule ordered by visit date and time
#[derive(Default)]
pub struct ScheduleView {
    visits: RwLock<Vec<Issue>>,
}

impl ScheduleView {
    pub fn snapshot(&self) -> Vec<Issue> {
        snapshot(&self.visits)
    }
}

impl View for ScheduleView {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        let mut visits = ctx.schedule.to_vec();
        // Unscheduled work sorts last
        visits.sort_by_key(|i| (i.scheduled_on().is_none(), i.scheduled_on(), i.scheduled_at()));
        store(&self.visits, visits);
    }
}

/// Open issues per building
#[derive(Default)]
pub struct MapOverlay {
    pins: RwLock<Vec<(String, usize)>>,
}

impl MapOverlay {
    pub fn snapshot(&self) -> Vec<(String, usize)> {
        snapshot(&self.pins)
    }
}

impl View for MapOverlay {
    fn name(&self) -> &'static str {
        "map"
    }

    fn render(&self, ctx: &RenderContext<'_>) {
        let mut pins: BTreeMap<String, usize> = BTreeMap::new();
        for issue in ctx.issues.iter().filter(|i| i.is_open()) {
            let building = issue
                .location
                .building
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string());
            *pins.entry(building).or_default() += 1;
        }
        store(&self.pins, pins.into_iter().collect());
    }
}

/// The stock views, with typed handles for the front end
#[derive(Clone, Default)]
pub struct StandardViews {
    pub home: Arc<HomeListView>,
    pub dashboard: Arc<DashboardView>,
    pub reports: Arc<ReportsView>,
    pub moderator: Arc<ModeratorView>,
    pub schedule: Arc<ScheduleView>,
    pub map: Arc<MapOverlay>,
}

impl StandardViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> ViewRegistry {
        ViewRegistry::new()
            .with_section(Section::Home, self.home.clone())
            .with_section(Section::Dashboard, self.dashboard.clone())
            .with_section(Section::Reports, self.reports.clone())
            .with_section(Section::Moderator, self.moderator.clone())
            .with_section(Section::Schedule, self.schedule.clone())
            .with_map(self.map.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Location;
    use chrono::{Duration, Utc};

    fn issue(id: &str, category: &str, status: Status, priority: Priority) -> Issue {
        let mut issue = Issue::new(id, category);
        issue.status = status;
        issue.priority = priority;
        issue
    }

    fn sample() -> Vec<Issue> {
        vec![
            issue("1", "Plumbing", Status::PendingReview, Priority::Urgent),
            issue("2", "Plumbing", Status::Completed, Priority::Low),
            issue("3", "Electrical", Status::InProgress, Priority::Urgent),
            issue("4", "HVAC", Status::Completed, Priority::Medium),
        ]
    }

    fn ctx<'a>(issues: &'a [Issue], filter: &'a IssueFilter) -> RenderContext<'a> {
        RenderContext {
            issues,
            filter,
            schedule: &[],
        }
    }

    #[test]
    fn test_dashboard_stats() {
        let stats = DashboardStats::from_issues(&sample());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.urgent_open, 2);
        assert_eq!(stats.count(Status::Completed), 2);
        assert_eq!(stats.count(Status::Rejected), 0);
    }

    #[test]
    fn test_report_series() {
        let report = ReportData::from_issues(&sample());
        assert_eq!(report.by_category[0], ("Plumbing".to_string(), 2));
        assert_eq!(report.by_category.len(), 3);
        assert!((report.resolution_rate - 0.5).abs() < f64::EPSILON);
        assert!(report.by_priority.contains(&(Priority::Urgent, 2)));
        assert_eq!(ReportData::from_issues(&[]).resolution_rate, 0.0);
    }

    #[test]
    fn test_moderator_queue_oldest_first() {
        let mut older = issue("old", "HVAC", Status::PendingReview, Priority::Low);
        older.created_at = Utc::now() - Duration::hours(5);
        let mut issues = sample();
        issues.push(older);

        let view = ModeratorView::default();
        view.render(&ctx(&issues, &IssueFilter::default()));
        let ids: Vec<String> = view.snapshot().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["old", "1"]);
    }

    #[test]
    fn test_home_applies_filter() {
        let issues = sample();
        let filter = IssueFilter {
            category: Some("plumbing".into()),
            ..Default::default()
        };
        let view = HomeListView::default();
        view.render(&ctx(&issues, &filter));
        assert_eq!(view.snapshot().len(), 2);
    }

    #[test]
    fn test_schedule_order() {
        let mut late = issue("late", "HVAC", Status::Scheduled, Priority::Low);
        late.scheduled_date = Some("2024-06-02".into());
        let mut early = issue("early", "HVAC", Status::Scheduled, Priority::Low);
        early.scheduled_date = Some("2024-06-01".into());
        early.scheduled_time = Some("14:00".into());
        let mut earlier = issue("earlier", "HVAC", Status::Scheduled, Priority::Low);
        earlier.scheduled_date = Some("2024-06-01".into());
        earlier.scheduled_time = Some("09:00".into());
        let floating = issue("none", "HVAC", Status::InProgress, Priority::Low);

        let schedule = vec![floating, late, early, earlier];
        let view = ScheduleView::default();
        view.render(&RenderContext {
            issues: &[],
            filter: &IssueFilter::default(),
            schedule: &schedule,
        });
        let ids: Vec<String> = view.snapshot().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["earlier", "early", "late", "none"]);
    }

    #[test]
    fn test_map_counts_open_issues_per_building() {
        let mut a = issue("a", "HVAC", Status::Scheduled, Priority::Low);
        a.location = Location {
            building: Some("Library".into()),
            ..Default::default()
        };
        let mut b = a.clone();
        b.id = "b".into();
        let mut done = a.clone();
        done.status = Status::Completed;
        let nowhere = issue("c", "HVAC", Status::PendingReview, Priority::Low);

        let issues = vec![a, b, done, nowhere];
        let map = MapOverlay::default();
        map.render(&ctx(&issues, &IssueFilter::default()));
        assert_eq!(
            map.snapshot(),
            vec![("Library".to_string(), 2), ("Unassigned".to_string(), 1)]
        );
    }

    #[test]
    fn test_registry_lookup() {
        let views = StandardViews::new();
        let registry = views.registry();
        let issues = sample();
        let filter = IssueFilter::default();

        assert!(registry.render_section(Section::Dashboard, &ctx(&issues, &filter)));
        assert!(!registry.render_section(Section::Chat, &ctx(&issues, &filter)));
        assert_eq!(views.dashboard.snapshot().total, 4);
        assert!(views.reports.snapshot().by_category.is_empty());
    }
}
