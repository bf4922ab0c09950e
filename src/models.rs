use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Upcoming,
    StoryCapture,
    Voting,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::StoryCapture => "story_capture",
            EventStatus::Voting => "voting",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "story_capture" => Ok(EventStatus::StoryCapture),
            "voting" => Ok(EventStatus::Voting),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(ServiceError::validation(format!("invalid status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(ServiceError::validation(format!("invalid role '{}'", other))),
        }
    }
}

/// Identity of whoever performs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Events hosted by this user.
    pub events: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub guest_count: i32,
    pub suggested_donation: Option<f64>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub is_draft: bool,
    pub unique_url: String,
    pub status: EventStatus,
    pub goal_amount: f64,
    pub current_amount: f64,
    pub host_id: Uuid,
    pub guests: Vec<Uuid>,
    /// Lowercased; superset of the guests' emails.
    pub invited_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_host(&self, user_id: Uuid) -> bool {
        self.host_id == user_id
    }

    pub fn is_guest(&self, user_id: Uuid) -> bool {
        self.guests.contains(&user_id)
    }
}

pub fn unique_url_for(event_id: &Uuid) -> String {
    format!("/events/{}", event_id)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub name: String,
    pub category_of_need: Option<String>,
    pub story: String,
    pub funds_usage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub description: String,
    pub nominator: String,
    pub recipient: Recipient,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub event_id: Uuid,
    pub story_id: Uuid,
    pub voter_email: String,
    pub vote_value: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Success,
    Pending,
    Failed,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Success => "success",
            ContributionStatus::Pending => "pending",
            ContributionStatus::Failed => "failed",
        }
    }
}

impl FromStr for ContributionStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(ContributionStatus::Success),
            "pending" => Ok(ContributionStatus::Pending),
            "failed" => Ok(ContributionStatus::Failed),
            other => Err(ServiceError::validation(format!(
                "invalid contribution status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
}
