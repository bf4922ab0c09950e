use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::{
    errors::{ServiceError, ServiceResult},
    models::{Contribution, ContributionStatus},
    PGPool,
};

use super::ContributionStore;

#[derive(FromRow)]
struct ContributionRecord {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    amount: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl ContributionRecord {
    fn to_domain(self) -> ServiceResult<Contribution> {
        let status = self.status.parse().map_err(|_| {
            log::error!("contribution {} carries unknown status '{}'", self.id, self.status);
            ServiceError::Internal
        })?;
        Ok(Contribution {
            id: self.id,
            event_id: self.event_id,
            user_id: self.user_id,
            amount: self.amount,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgContributionStore {
    pool: PGPool,
}

impl PgContributionStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributionStore for PgContributionStore {
    async fn find_by_user(
        &self,
        user_id: Uuid,
        status: Option<ContributionStatus>,
    ) -> ServiceResult<Vec<Contribution>> {
        let records = sqlx::query_as::<_, ContributionRecord>(
            "SELECT id, event_id, user_id, amount, status, created_at FROM contributions \
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2) ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(ContributionRecord::to_domain).collect()
    }

    async fn find_by_event_id(&self, event_id: Uuid) -> ServiceResult<Vec<Contribution>> {
        let records = sqlx::query_as::<_, ContributionRecord>(
            "SELECT id, event_id, user_id, amount, status, created_at FROM contributions \
            WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        records.into_iter().map(ContributionRecord::to_domain).collect()
    }

    async fn create(&self, contribution: &Contribution) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO contributions (id, event_id, user_id, amount, status, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(contribution.id)
        .bind(contribution.event_id)
        .bind(contribution.user_id)
        .bind(contribution.amount)
        .bind(contribution.status.as_str())
        .bind(contribution.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
