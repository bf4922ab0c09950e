use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    errors::ServiceResult,
    models::{Recipient, Story},
    PGPool,
};

use super::StoryStore;

const STORY_COLUMNS: &str = "id, event_id, title, description, nominator, recipient_name, \
    recipient_category, recipient_story, recipient_funds_usage, created_at";

#[derive(FromRow)]
struct StoryRecord {
    id: Uuid,
    event_id: Uuid,
    title: String,
    description: String,
    nominator: String,
    recipient_name: String,
    recipient_category: Option<String>,
    recipient_story: String,
    recipient_funds_usage: String,
    created_at: DateTime<Utc>,
}

impl StoryRecord {
    fn to_domain(self) -> Story {
        Story {
            id: self.id,
            event_id: self.event_id,
            title: self.title,
            description: self.description,
            nominator: self.nominator,
            recipient: Recipient {
                name: self.recipient_name,
                category_of_need: self.recipient_category,
                story: self.recipient_story,
                funds_usage: self.recipient_funds_usage,
            },
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgStoryStore {
    pool: PGPool,
}

impl PgStoryStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Story>> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {} FROM stories WHERE id = $1",
            STORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(StoryRecord::to_domain))
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Story>> {
        let records = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {} FROM stories WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            STORY_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(StoryRecord::to_domain).collect())
    }

    async fn create(&self, story: &Story) -> ServiceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO stories ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            STORY_COLUMNS
        ))
        .bind(story.id)
        .bind(story.event_id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&story.nominator)
        .bind(&story.recipient.name)
        .bind(&story.recipient.category_of_need)
        .bind(&story.recipient.story)
        .bind(&story.recipient.funds_usage)
        .bind(story.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
