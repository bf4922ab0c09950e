use async_trait::async_trait;
use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    errors::ServiceResult,
    service::notification::{Email, Notifier},
    PGPool,
};

/// Writes outgoing mail into the `notifications` outbox, drained by the
/// mail relay. Rows stay pending (`sending_dt` NULL) until the relay
/// delivers them.
#[derive(Clone)]
pub struct PgNotifier {
    pool: PGPool,
}

impl PgNotifier {
    pub fn new(pool: PGPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Notifier for PgNotifier {
    async fn send(&self, email: &Email) -> ServiceResult<()> {
        let notification_id = notifications::create(email, &self.pool).await?;
        info!("queued notification {} for {}", notification_id, email.to);
        Ok(())
    }
}

pub mod notifications {
    use super::*;

    pub(crate) const QUEUE_NOTIFICATION: &str = "INSERT INTO notifications \
        (id, recipient, subject, content, track_clicks, creation_dt) \
        VALUES ($1, $2, $3, $4, $5, $6)";

    pub async fn create(email: &Email, pool: &PGPool) -> Result<Uuid, sqlx::Error> {
        let notification_id = Uuid::new_v4();
        sqlx::query(QUEUE_NOTIFICATION)
            .bind(notification_id)
            .bind(&email.to)
            .bind(&email.subject)
            .bind(&email.html)
            .bind(email.options.track_clicks)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        Ok(notification_id)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn queued_notifications_stay_pending() {
            assert!(QUEUE_NOTIFICATION.starts_with("INSERT INTO notifications"));
            assert!(!QUEUE_NOTIFICATION.contains("sending_dt"));
        }
    }
}
