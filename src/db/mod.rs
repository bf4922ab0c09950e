pub mod contribution;
pub mod event;
pub mod invitations;
pub mod memory;
pub mod story;
pub mod user;
pub mod vote;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::info;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::dto::UpdateEventDto;
use crate::errors::ServiceResult;
use crate::models::{Contribution, ContributionStatus, Event, EventStatus, Story, User, Vote};
use crate::PGPool;

use self::memory::MemoryStore;

pub async fn init_db_pool(db_url: &str, max_connections: u32) -> Result<PGPool, sqlx::Error> {
    let pool: PGPool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("connected to postgres, migrations applied");
    Ok(pool)
}

/// Selection presets for event listings.
#[derive(Debug, Clone, PartialEq)]
pub enum EventFilter {
    /// Every published event.
    Published,
    /// Published public events still upcoming on or after `from`.
    PublicUpcoming { from: NaiveDate },
    /// Published events hosted by or attended by the user.
    Participant(Uuid),
    /// Published events the user is a guest of.
    GuestOf(Uuid),
    /// Published events among the given ids.
    Ids(Vec<Uuid>),
    /// Drafts, restricted to one host when set.
    Drafts { host: Option<Uuid> },
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::Published => !event.is_draft,
            EventFilter::PublicUpcoming { from } => {
                !event.is_draft
                    && event.is_public
                    && event.status == EventStatus::Upcoming
                    && event.date >= *from
            }
            EventFilter::Participant(user_id) => {
                !event.is_draft && (event.is_host(*user_id) || event.is_guest(*user_id))
            }
            EventFilter::GuestOf(user_id) => !event.is_draft && event.is_guest(*user_id),
            EventFilter::Ids(ids) => !event.is_draft && ids.contains(&event.id),
            EventFilter::Drafts { host } => {
                event.is_draft && host.map_or(true, |h| event.is_host(h))
            }
        }
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Event>>;
    /// Ordered by date, then creation time.
    async fn find(&self, filter: &EventFilter, skip: u64, limit: u64) -> ServiceResult<Vec<Event>>;
    async fn count(&self, filter: &EventFilter) -> ServiceResult<u64>;
    async fn create(&self, event: &Event) -> ServiceResult<()>;
    /// Writes only the fields present in `patch`. A patch that turns a
    /// published event back into a draft matches nothing. Returns the
    /// stored event, or `None` when no row matched.
    async fn update_fields(
        &self,
        id: Uuid,
        patch: &UpdateEventDto,
    ) -> ServiceResult<Option<Event>>;
    /// Sets the status; a draft only accepts `Cancelled`. Returns the stored
    /// event, or `None` when no row matched.
    async fn set_status(&self, id: Uuid, status: EventStatus) -> ServiceResult<Option<Event>>;
    async fn delete_by_id(&self, id: Uuid) -> ServiceResult<bool>;
    /// Returns `false` when the user already was a guest.
    async fn add_guest(&self, id: Uuid, user_id: Uuid) -> ServiceResult<bool>;
    /// Returns `false` when the email already was recorded.
    async fn add_invited_email(&self, id: Uuid, email: &str) -> ServiceResult<bool>;
    async fn add_to_current_amount(&self, id: Uuid, amount: f64) -> ServiceResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>>;
    async fn push_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()>;
    async fn pull_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()>;
}

#[async_trait]
pub trait StoryStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Story>>;
    /// In creation order.
    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Story>>;
    async fn create(&self, story: &Story) -> ServiceResult<()>;
}

#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn find_one(&self, event_id: Uuid, voter_email: &str) -> ServiceResult<Option<Vote>>;
    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Vote>>;
    /// Atomic on (event_id, voter_email); returns `false` if a vote already
    /// exists for the pair and nothing was written.
    async fn insert_if_absent(&self, vote: &Vote) -> ServiceResult<bool>;
}

#[async_trait]
pub trait ContributionStore: Send + Sync {
    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<ContributionStatus>,
    ) -> ServiceResult<Vec<Contribution>>;
    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Contribution>>;
    async fn create(&self, contribution: &Contribution) -> ServiceResult<()>;
}

#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventStore>,
    pub users: Arc<dyn UserStore>,
    pub stories: Arc<dyn StoryStore>,
    pub votes: Arc<dyn VoteStore>,
    pub contributions: Arc<dyn ContributionStore>,
}

impl Stores {
    pub fn postgres(pool: PGPool) -> Self {
        Self {
            events: Arc::new(event::PgEventStore::new(pool.clone())),
            users: Arc::new(user::PgUserStore::new(pool.clone())),
            stories: Arc::new(story::PgStoryStore::new(pool.clone())),
            votes: Arc::new(vote::PgVoteStore::new(pool.clone())),
            contributions: Arc::new(contribution::PgContributionStore::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            events: store.clone(),
            users: store.clone(),
            stories: store.clone(),
            votes: store.clone(),
            contributions: store,
        }
    }
}

/// Postgres SQLSTATE for unique constraint violations.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

/// Page size meaning "no limit", still representable as a Postgres BIGINT.
pub const UNBOUNDED: u64 = i64::MAX as u64;
