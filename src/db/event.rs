use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{prelude::FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dto::UpdateEventDto,
    errors::{ServiceError, ServiceResult},
    models::{Event, EventStatus},
    PGPool,
};

use super::{EventFilter, EventStore};

const EVENT_COLUMNS: &str = "id, title, description, date, time, location, guest_count, \
    suggested_donation, image_url, is_public, is_draft, unique_url, status, goal_amount, \
    current_amount, host_id, guests, invited_emails, created_at";

#[derive(FromRow)]
struct EventRecord {
    id: Uuid,
    title: String,
    description: String,
    date: NaiveDate,
    time: String,
    location: String,
    guest_count: i32,
    suggested_donation: Option<f64>,
    image_url: Option<String>,
    is_public: bool,
    is_draft: bool,
    unique_url: String,
    status: String,
    goal_amount: f64,
    current_amount: f64,
    host_id: Uuid,
    guests: Vec<Uuid>,
    invited_emails: Vec<String>,
    created_at: DateTime<Utc>,
}

impl EventRecord {
    fn to_domain(self) -> ServiceResult<Event> {
        let status = self.status.parse().map_err(|_| {
            log::error!("event {} carries unknown status '{}'", self.id, self.status);
            ServiceError::Internal
        })?;
        Ok(Event {
            id: self.id,
            title: self.title,
            description: self.description,
            date: self.date,
            time: self.time,
            location: self.location,
            guest_count: self.guest_count,
            suggested_donation: self.suggested_donation,
            image_url: self.image_url,
            is_public: self.is_public,
            is_draft: self.is_draft,
            unique_url: self.unique_url,
            status,
            goal_amount: self.goal_amount,
            current_amount: self.current_amount,
            host_id: self.host_id,
            guests: self.guests,
            invited_emails: self.invited_emails,
            created_at: self.created_at,
        })
    }
}

fn push_filter(query_builder: &mut QueryBuilder<'_, Postgres>, filter: &EventFilter) {
    match filter {
        EventFilter::Published => {
            query_builder.push(" WHERE is_draft = FALSE");
        }
        EventFilter::PublicUpcoming { from } => {
            query_builder
                .push(" WHERE is_draft = FALSE AND is_public = TRUE AND status = 'upcoming' AND date >= ")
                .push_bind(*from);
        }
        EventFilter::Participant(user_id) => {
            query_builder
                .push(" WHERE is_draft = FALSE AND (host_id = ")
                .push_bind(*user_id)
                .push(" OR ")
                .push_bind(*user_id)
                .push(" = ANY(guests))");
        }
        EventFilter::GuestOf(user_id) => {
            query_builder
                .push(" WHERE is_draft = FALSE AND ")
                .push_bind(*user_id)
                .push(" = ANY(guests)");
        }
        EventFilter::Ids(ids) => {
            query_builder
                .push(" WHERE is_draft = FALSE AND id = ANY(")
                .push_bind(ids.clone())
                .push(")");
        }
        EventFilter::Drafts { host } => {
            query_builder.push(" WHERE is_draft = TRUE");
            if let Some(host_id) = host {
                query_builder.push(" AND host_id = ").push_bind(*host_id);
            }
        }
    }
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PGPool,
}

impl PgEventStore {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn find_by_id(&self, id: Uuid) -> ServiceResult<Option<Event>> {
        let record = sqlx::query_as::<_, EventRecord>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(EventRecord::to_domain).transpose()
    }

    async fn find(&self, filter: &EventFilter, skip: u64, limit: u64) -> ServiceResult<Vec<Event>> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM events", EVENT_COLUMNS));
        push_filter(&mut query_builder, filter);
        query_builder
            .push(" ORDER BY date ASC, created_at ASC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(skip as i64);
        let records = query_builder
            .build_query_as::<EventRecord>()
            .fetch_all(&self.pool)
            .await?;
        records.into_iter().map(EventRecord::to_domain).collect()
    }

    async fn count(&self, filter: &EventFilter) -> ServiceResult<u64> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM events");
        push_filter(&mut query_builder, filter);
        let total: i64 = query_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn create(&self, event: &Event) -> ServiceResult<()> {
        sqlx::query(&format!(
            "INSERT INTO events ({}) VALUES \
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.time)
        .bind(&event.location)
        .bind(event.guest_count)
        .bind(event.suggested_donation)
        .bind(&event.image_url)
        .bind(event.is_public)
        .bind(event.is_draft)
        .bind(&event.unique_url)
        .bind(event.status.as_str())
        .bind(event.goal_amount)
        .bind(event.current_amount)
        .bind(event.host_id)
        .bind(&event.guests)
        .bind(&event.invited_emails)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &UpdateEventDto,
    ) -> ServiceResult<Option<Event>> {
        if patch.field_count() == 0 {
            return EventStore::find_by_id(self, id).await;
        }
        let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET ");
        {
            let mut assignments = query_builder.separated(", ");
            if let Some(v) = &patch.title {
                assignments.push("title = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &patch.description {
                assignments.push("description = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = patch.date {
                assignments.push("date = ").push_bind_unseparated(v);
            }
            if let Some(v) = &patch.time {
                assignments.push("time = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = &patch.location {
                assignments.push("location = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = patch.guest_count {
                assignments.push("guest_count = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.suggested_donation {
                assignments.push("suggested_donation = ").push_bind_unseparated(v);
            }
            if let Some(v) = &patch.image_url {
                assignments.push("image_url = ").push_bind_unseparated(v.clone());
            }
            if let Some(v) = patch.is_public {
                assignments.push("is_public = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.is_draft {
                assignments.push("is_draft = ").push_bind_unseparated(v);
            }
            if let Some(v) = patch.goal_amount {
                assignments.push("goal_amount = ").push_bind_unseparated(v);
            }
        }
        query_builder.push(" WHERE id = ").push_bind(id);
        if patch.is_draft == Some(true) {
            query_builder.push(" AND is_draft = TRUE");
        }
        query_builder.push(format!(" RETURNING {}", EVENT_COLUMNS));

        let record = query_builder
            .build_query_as::<EventRecord>()
            .fetch_optional(&self.pool)
            .await?;
        record.map(EventRecord::to_domain).transpose()
    }

    async fn set_status(&self, id: Uuid, status: EventStatus) -> ServiceResult<Option<Event>> {
        let record = sqlx::query_as::<_, EventRecord>(&format!(
            "UPDATE events SET status = $2 \
            WHERE id = $1 AND (is_draft = FALSE OR $2 = 'cancelled') \
            RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        record.map(EventRecord::to_domain).transpose()
    }

    async fn delete_by_id(&self, id: Uuid) -> ServiceResult<bool> {
        let res = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_guest(&self, id: Uuid, user_id: Uuid) -> ServiceResult<bool> {
        let res = sqlx::query(
            "UPDATE events SET guests = array_append(guests, $2) \
            WHERE id = $1 AND NOT ($2 = ANY(guests))",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_invited_email(&self, id: Uuid, email: &str) -> ServiceResult<bool> {
        let res = sqlx::query(
            "UPDATE events SET invited_emails = array_append(invited_emails, $2) \
            WHERE id = $1 AND NOT ($2 = ANY(invited_emails))",
        )
        .bind(id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_to_current_amount(&self, id: Uuid, amount: f64) -> ServiceResult<()> {
        sqlx::query("UPDATE events SET current_amount = current_amount + $2 WHERE id = $1")
            .bind(id)
            .bind(amount)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
