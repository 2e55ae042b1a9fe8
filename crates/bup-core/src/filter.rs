//! Client-side filtering of the issue list

use crate::issue::{Issue, Priority, Status};

/// Active filters of the home list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub query: String,
}

impl IssueFilter {
    pub fn is_active(&self) -> bool {
        self.status.is_some()
            || self.category.is_some()
            || self.priority.is_some()
            || !self.query.trim().is_empty()
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status
            && issue.status != status
        {
            return false;
        }

        if let Some(ref category) = self.category
            && !issue.category.eq_ignore_ascii_case(category)
        {
            return false;
        }

        if let Some(priority) = self.priority
            && issue.priority != priority
        {
            return false;
        }

        let query = self.query.trim();
        if !query.is_empty() {
            let query_lower = query.to_lowercase();
            let haystacks = [
                Some(issue.description.as_str()),
                Some(issue.category.as_str()),
                Some(issue.id.as_str()),
                issue.location.building.as_deref(),
                issue.location.room.as_deref(),
            ];
            if !haystacks
                .iter()
                .flatten()
                .any(|h| h.to_lowercase().contains(&query_lower))
            {
                return false;
            }
        }

        true
    }

    /// Matching issues, newest first
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        let mut matched: Vec<Issue> = issues.iter().filter(|i| self.matches(i)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
