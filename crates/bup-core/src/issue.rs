//! Issue data model for bup
//!
//! Field names follow the issue backend's JSON (camelCase, `_id`).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Issue status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    PendingReview,
    Scheduled,
    InProgress,
    Completed,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::PendingReview,
        Status::Scheduled,
        Status::InProgress,
        Status::Completed,
        Status::Rejected,
    ];

    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Status::PendingReview | Status::Scheduled | Status::InProgress
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::PendingReview => "Pending review",
            Status::Scheduled => "Scheduled",
            Status::InProgress => "In progress",
            Status::Completed => "Completed",
            Status::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for Status {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending-review" | "pending_review" | "pending review" | "pending" => {
                Ok(Status::PendingReview)
            }
            "scheduled" => Ok(Status::Scheduled),
            "in-progress" | "in_progress" | "in progress" | "inprogress" => Ok(Status::InProgress),
            "completed" | "done" => Ok(Status::Completed),
            "rejected" => Ok(Status::Rejected),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::PendingReview => write!(f, "pending-review"),
            Status::Scheduled => write!(f, "scheduled"),
            Status::InProgress => write!(f, "in-progress"),
            Status::Completed => write!(f, "completed"),
            Status::Rejected => write!(f, "rejected"),
        }
    }
}

/// Wire values go through `FromStr`, so casing and aliases are accepted
fn from_wire<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr<Err = crate::Error>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim().parse().map_err(serde::de::Error::custom)
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        from_wire(deserializer)
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        from_wire(deserializer)
    }
}

/// Issue priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];
}

impl std::str::FromStr for Priority {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" | "critical" => Ok(Priority::Urgent),
            _ => Err(crate::Error::InvalidPriority(s.to_string())),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Urgent => write!(f, "urgent"),
        }
    }
}

/// Where on campus the issue is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = [
            self.building.clone(),
            self.floor.as_ref().map(|fl| format!("floor {}", fl)),
            self.room.as_ref().map(|r| format!("room {}", r)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            write!(f, "unknown location")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Embedded user record, as populated by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A user reference: either a bare id or a populated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    Id(String),
    User(UserSummary),
}

impl UserRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            UserRef::Id(id) => Some(id),
            UserRef::User(user) => user.id.as_deref(),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            UserRef::Id(id) => id,
            UserRef::User(user) => user
                .name
                .as_deref()
                .or(user.email.as_deref())
                .or(user.id.as_deref())
                .unwrap_or("unknown"),
        }
    }
}

/// Core issue structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Backend identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,

    /// Facility category (electrical, plumbing, ...)
    pub category: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(flatten)]
    pub location: Location,

    #[serde(default)]
    pub description: String,

    /// Who reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<UserRef>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub status: Status,

    /// Hosted image URLs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,

    /// Technician visit date (YYYY-MM-DD or RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,

    /// Technician visit time (HH:MM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,

    /// Technician the issue is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserRef>,
}

impl Issue {
    /// Create a new issue with minimal required fields
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            priority: Priority::Medium,
            location: Location::default(),
            description: String::new(),
            submitted_by: None,
            created_at: Utc::now(),
            status: Status::PendingReview,
            images: Vec::new(),
            scheduled_date: None,
            scheduled_time: None,
            assigned_to: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Visit date, if one is set and parseable
    pub fn scheduled_on(&self) -> Option<NaiveDate> {
        let raw = self.scheduled_date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|dt| dt.date_naive())
            })
    }

    pub fn scheduled_at(&self) -> Option<NaiveTime> {
        let raw = self.scheduled_time.as_deref()?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .ok()
            .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M:%S").ok())
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] [{}] {} - {}",
            self.id, self.priority, self.category, self.status, self.location
        )
    }
}

/// Body of `POST /api/issues`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIssue {
    pub category: String,
    pub priority: Priority,
    #[serde(flatten)]
    pub location: Location,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    pub images: Vec<String>,
}

/// Image picked for upload but not yet hosted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl StagedImage {
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = content_type_for(path).to_string();
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// The submission form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDraft {
    pub category: String,
    pub priority: Priority,
    pub location: Location,
    pub description: String,
    /// Staged image previews
    pub images: Vec<StagedImage>,
}

impl IssueDraft {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Compose the create payload once images are hosted
    pub fn to_new_issue(&self, submitted_by: Option<String>, images: Vec<String>) -> NewIssue {
        NewIssue {
            category: self.category.trim().to_string(),
            priority: self.priority,
            location: self.location.clone(),
            description: self.description.trim().to_string(),
            submitted_by,
            images,
        }
    }
}
