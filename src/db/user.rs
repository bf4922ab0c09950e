use async_trait::async_trait;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    errors::{ServiceError, ServiceResult},
    models::User,
    PGPool,
};

use super::UserStore;

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    events: Vec<Uuid>,
}

impl UserRecord {
    fn to_domain(self) -> ServiceResult<User> {
        let role = self.role.parse().map_err(|_| {
            log::error!("user {} carries unknown role '{}'", self.id, self.role);
            ServiceError::Internal
        })?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            role,
            events: self.events,
        })
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PGPool,
}

impl PgUserStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, events FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(UserRecord::to_domain).transpose()
    }

    // emails are stored as registered, compare case-insensitively
    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, events FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        record.map(UserRecord::to_domain).transpose()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> ServiceResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, events FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn push_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()> {
        sqlx::query(
            "UPDATE users SET events = array_append(events, $2) \
            WHERE id = $1 AND NOT ($2 = ANY(events))",
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn pull_event(&self, user_id: Uuid, event_id: Uuid) -> ServiceResult<()> {
        sqlx::query("UPDATE users SET events = array_remove(events, $2) WHERE id = $1")
            .bind(user_id)
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
