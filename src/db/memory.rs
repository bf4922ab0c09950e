use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    dto::UpdateEventDto,
    errors::{ServiceError, ServiceResult},
    models::{Contribution, ContributionStatus, Event, EventStatus, Story, User, Vote},
    service::notification::{Email, Notifier},
};

use super::{ContributionStore, EventFilter, EventStore, StoryStore, UserStore, VoteStore};

/// Process-local stores for runs without a database and for tests.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
    users: RwLock<HashMap<Uuid, User>>,
    stories: RwLock<Vec<Story>>,
    votes: RwLock<Vec<Vote>>,
    contributions: RwLock<Vec<Contribution>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    #[cfg(test)]
    pub async fn vote_count(&self) -> usize {
        self.votes.read().await.len()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Event>> {
        Ok(self.events.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn find(&self, filter: &EventFilter, skip: u64, limit: u64) -> ServiceResult<Vec<Event>> {
        let mut matching: Vec<Event> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(matching
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, filter: &EventFilter) -> ServiceResult<u64> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn create(&self, event: &Event) -> ServiceResult<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &UpdateEventDto,
    ) -> ServiceResult<Option<Event>> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) if !event.is_draft && patch.is_draft == Some(true) => Ok(None),
            Some(event) => {
                patch.apply_to(event);
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn set_status(&self, id: Uuid, status: EventStatus) -> ServiceResult<Option<Event>> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) if event.is_draft && status != EventStatus::Cancelled => Ok(None),
            Some(event) => {
                event.status = status;
                Ok(Some(event.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> ServiceResult<bool> {
        let mut events = self.events.write().await;
        let before = events.len();
        events.retain(|e| e.id != id);
        Ok(events.len() != before)
    }

    async fn add_guest(&self, id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) if !event.guests.contains(&user_id) => {
                event.guests.push(user_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_invited_email(&self, id: Uuid, email: &str) -> ServiceResult<bool> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == id) {
            Some(event) if !event.invited_emails.iter().any(|e| e == email) => {
                event.invited_emails.push(email.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_to_current_amount(&self, id: Uuid, amount: f64) -> ServiceResult<()> {
        if let Some(event) = self.events.write().await.iter_mut().find(|e| e.id == id) {
            event.current_amount += amount;
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn push_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()> {
        match self.users.write().await.get_mut(&user_id) {
            Some(user) if !user.events.contains(&event_id) => user.events.push(event_id),
            Some(_) => {}
            None => debug!("push_event: no user {}", user_id),
        }
        Ok(())
    }

    async fn pull_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.events.retain(|id| *id != event_id);
        }
        Ok(())
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Story>> {
        Ok(self.stories.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Story>> {
        let stories = self.stories.read().await;
        Ok(stories.iter().filter(|s| s.event_id == event_id).cloned().collect())
    }

    async fn create(&self, story: &Story) -> ServiceResult<()> {
        self.stories.write().await.push(story.clone());
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn find_one(&self, event_id: Uuid, voter_email: &str) -> ServiceResult<Option<Vote>> {
        let votes = self.votes.read().await;
        Ok(votes
            .iter()
            .find(|v| v.event_id == event_id && v.voter_email == voter_email)
            .cloned())
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Vote>> {
        let votes = self.votes.read().await;
        Ok(votes.iter().filter(|v| v.event_id == event_id).cloned().collect())
    }

    // check and push happen under one write lock
    async fn insert_if_absent(&self, vote: &Vote) -> ServiceResult<bool> {
        let mut votes = self.votes.write().await;
        if votes
            .iter()
            .any(|v| v.event_id == vote.event_id && v.voter_email == vote.voter_email)
        {
            return Ok(false);
        }
        votes.push(vote.clone());
        Ok(true)
    }
}

#[async_trait]
impl ContributionStore for MemoryStore {
    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<ContributionStatus>,
    ) -> ServiceResult<Vec<Contribution>> {
        let contributions = self.contributions.read().await;
        Ok(contributions
            .iter()
            .filter(|c| c.user_id == user_id && status.map_or(true, |s| c.status == s))
            .cloned()
            .collect())
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Contribution>> {
        let contributions = self.contributions.read().await;
        Ok(contributions
            .iter()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn create(&self, contribution: &Contribution) -> ServiceResult<()> {
        self.contributions.write().await.push(contribution.clone());
        Ok(())
    }
}

/// Keeps sent mail in memory instead of delivering it.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: RwLock<Vec<Email>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn sent(&self) -> Vec<Email> {
        self.sent.read().await.clone()
    }

    /// Makes every following `send` fail, to simulate a mail outage.
    #[cfg(test)]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, email: &Email) -> ServiceResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Internal);
        }
        info!("mail to {}: {}", email.to, email.subject);
        self.sent.write().await.push(email.clone());
        Ok(())
    }
}
