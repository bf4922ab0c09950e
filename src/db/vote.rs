use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{errors::ServiceResult, models::Vote, PGPool};

use super::{VoteStore, UNIQUE_VIOLATION};

#[derive(FromRow)]
struct VoteRecord {
    id: Uuid,
    event_id: Uuid,
    story_id: Uuid,
    voter_email: String,
    vote_value: i32,
    created_at: DateTime<Utc>,
}

impl VoteRecord {
    fn to_domain(self) -> Vote {
        Vote {
            id: self.id,
            event_id: self.event_id,
            story_id: self.story_id,
            voter_email: self.voter_email,
            vote_value: self.vote_value,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgVoteStore {
    pool: PGPool,
}

impl PgVoteStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn find_one(&self, event_id: Uuid, voter_email: &str) -> ServiceResult<Option<Vote>> {
        let record = sqlx::query_as::<_, VoteRecord>(
            "SELECT id, event_id, story_id, voter_email, vote_value, created_at \
            FROM votes WHERE event_id = $1 AND voter_email = $2",
        )
        .bind(event_id)
        .bind(voter_email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record.map(VoteRecord::to_domain))
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Vote>> {
        let records = sqlx::query_as::<_, VoteRecord>(
            "SELECT id, event_id, story_id, voter_email, vote_value, created_at \
            FROM votes WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records.into_iter().map(VoteRecord::to_domain).collect())
    }

    // votes_event_voter_key closes the gap between find_one and this insert
    async fn insert_if_absent(&self, vote: &Vote) -> ServiceResult<bool> {
        let res = sqlx::query(
            "INSERT INTO votes (id, event_id, story_id, voter_email, vote_value, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(vote.id)
        .bind(vote.event_id)
        .bind(vote.story_id)
        .bind(&vote.voter_email)
        .bind(vote.vote_value)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await;
        match res {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(err)) if err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
