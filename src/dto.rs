use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ContributionStatus, Event, EventStatus, Recipient, Role};

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewEventDto {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub guest_count: i32,
    pub suggested_donation: Option<f64>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
    pub is_draft: Option<bool>,
    pub goal_amount: Option<f64>,
}

#[derive(Debug, Default, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub guest_count: Option<i32>,
    pub suggested_donation: Option<f64>,
    pub image_url: Option<String>,
    pub is_public: Option<bool>,
    pub is_draft: Option<bool>,
    pub goal_amount: Option<f64>,
}

impl UpdateEventDto {
    /// Number of fields the patch carries.
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.description.is_some(),
            self.date.is_some(),
            self.time.is_some(),
            self.location.is_some(),
            self.guest_count.is_some(),
            self.suggested_donation.is_some(),
            self.image_url.is_some(),
            self.is_public.is_some(),
            self.is_draft.is_some(),
            self.goal_amount.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    /// Writes the provided fields into `event`.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(v) = &self.title {
            event.title = v.clone();
        }
        if let Some(v) = &self.description {
            event.description = v.clone();
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(v) = &self.time {
            event.time = v.clone();
        }
        if let Some(v) = &self.location {
            event.location = v.clone();
        }
        if let Some(v) = self.guest_count {
            event.guest_count = v;
        }
        if let Some(v) = self.suggested_donation {
            event.suggested_donation = Some(v);
        }
        if let Some(v) = &self.image_url {
            event.image_url = Some(v.clone());
        }
        if let Some(v) = self.is_public {
            event.is_public = v;
        }
        if let Some(v) = self.is_draft {
            event.is_draft = v;
        }
        if let Some(v) = self.goal_amount {
            event.goal_amount = v;
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatusDto {
    pub status: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteDto {
    pub email: String,
}

/// Invitation submitted from the host's form, identifying the host by email.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InviteFormDto {
    pub host_email: String,
    pub guest_email: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InviteOutcome {
    pub email: String,
    pub already_invited: bool,
    pub guest_added: bool,
    pub notified: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewStoryDto {
    pub title: String,
    pub description: String,
    pub nominator: String,
    pub recipient: Recipient,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    pub story_id: Uuid,
    pub voter_email: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewContributionDto {
    pub user_id: Uuid,
    pub amount: f64,
    pub status: ContributionStatus,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub limit: u64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryResult {
    pub story_id: Uuid,
    pub title: String,
    pub recipient_name: String,
    pub category: String,
    pub votes: u64,
    pub percentage: String,
    pub funds_distributed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultsDto {
    pub total_participants: u64,
    pub total_votes_cast: u64,
    pub completion_rate: String,
    pub top_category: Option<String>,
    pub results: Vec<StoryResult>,
    pub total_funds: f64,
}

/// Event projection shown on a participant's dashboard.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub image_url: Option<String>,
    pub status: EventStatus,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date,
            time: event.time.clone(),
            location: event.location.clone(),
            image_url: event.image_url.clone(),
            status: event.status,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationDto {
    pub event_count: u64,
    pub total_donated: f64,
    pub events: Vec<EventSummary>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: &Uuid, role: Role, exp: usize) -> Self {
        Self {
            sub: *user_id,
            role,
            exp,
        }
    }
}
