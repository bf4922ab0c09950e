use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    db::{EventFilter, Stores, UNBOUNDED},
    dto::{EventSummary, ParticipationDto},
    errors::ServiceResult,
    models::{ContributionStatus, Event},
};

async fn guest_events(user_id: Uuid, stores: &Stores) -> ServiceResult<Vec<Event>> {
    stores
        .events
        .find(&EventFilter::GuestOf(user_id), 0, UNBOUNDED)
        .await
}

async fn donated_event_ids(user_id: Uuid, stores: &Stores) -> ServiceResult<HashSet<Uuid>> {
    let contributions = stores
        .contributions
        .find_by_user(user_id, Some(ContributionStatus::Success))
        .await?;
    Ok(contributions.into_iter().map(|c| c.event_id).collect())
}

/// Published events the user is a guest of, plus every event the user has
/// successfully donated to, each counted once.
pub async fn count_participant_events(user_id: Uuid, stores: &Stores) -> ServiceResult<u64> {
    let mut ids = donated_event_ids(user_id, stores).await?;
    ids.extend(guest_events(user_id, stores).await?.into_iter().map(|e| e.id));
    Ok(ids.len() as u64)
}

pub async fn sum_participant_donations(user_id: Uuid, stores: &Stores) -> ServiceResult<f64> {
    let contributions = stores
        .contributions
        .find_by_user(user_id, Some(ContributionStatus::Success))
        .await?;
    Ok(contributions.iter().map(|c| c.amount).sum())
}

/// Newest date first; same-day events by most recently created.
pub async fn list_participant_events(
    user_id: Uuid,
    stores: &Stores,
) -> ServiceResult<Vec<EventSummary>> {
    let mut events = guest_events(user_id, stores).await?;
    let seen: HashSet<Uuid> = events.iter().map(|e| e.id).collect();
    let donor_only: Vec<Uuid> = donated_event_ids(user_id, stores)
        .await?
        .into_iter()
        .filter(|id| !seen.contains(id))
        .collect();
    if !donor_only.is_empty() {
        events.extend(
            stores
                .events
                .find(&EventFilter::Ids(donor_only), 0, UNBOUNDED)
                .await?,
        );
    }
    events.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    Ok(events.iter().map(EventSummary::from).collect())
}

pub async fn summary(user_id: Uuid, stores: &Stores) -> ServiceResult<ParticipationDto> {
    Ok(ParticipationDto {
        event_count: count_participant_events(user_id, stores).await?,
        total_donated: sum_participant_donations(user_id, stores).await?,
        events: list_participant_events(user_id, stores).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    use crate::dto::NewContributionDto;
    use crate::models::Contribution;
    use crate::service::{contribution, event};
    use crate::test_utils::{sample_event, TestEnv};

    async fn contribute(env: &TestEnv, event_id: Uuid, user_id: Uuid, amount: f64, status: ContributionStatus) {
        let contribution = Contribution {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            amount,
            status,
            created_at: Utc::now(),
        };
        env.stores.contributions.create(&contribution).await.unwrap();
    }

    #[actix_rt::test]
    async fn guest_and_donor_events_are_unioned() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let p = env.user("Pat", "pat@example.com").await;

        let mut e1 = sample_event(host.id);
        e1.guests.push(p.id);
        e1.date = NaiveDate::from_ymd_opt(2031, 1, 10).unwrap();
        env.put_event(&e1).await;
        let mut e2 = sample_event(host.id);
        e2.date = NaiveDate::from_ymd_opt(2031, 3, 5).unwrap();
        env.put_event(&e2).await;

        contribute(&env, e2.id, p.id, 30.0, ContributionStatus::Success).await;
        contribute(&env, e2.id, p.id, 20.0, ContributionStatus::Success).await;
        contribute(&env, e1.id, p.id, 15.0, ContributionStatus::Success).await;
        contribute(&env, e1.id, p.id, 99.0, ContributionStatus::Failed).await;

        assert_eq!(count_participant_events(p.id, &env.stores).await.unwrap(), 2);
        assert_eq!(sum_participant_donations(p.id, &env.stores).await.unwrap(), 65.0);

        let events = list_participant_events(p.id, &env.stores).await.unwrap();
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![e2.id, e1.id]);
    }

    #[actix_rt::test]
    async fn drafts_and_unsuccessful_payments_are_ignored() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let p = env.user("Pat", "pat@example.com").await;

        let mut draft = sample_event(host.id);
        draft.is_draft = true;
        draft.guests.push(p.id);
        env.put_event(&draft).await;
        let pending = sample_event(host.id);
        env.put_event(&pending).await;
        contribute(&env, pending.id, p.id, 50.0, ContributionStatus::Pending).await;

        let summary = summary(p.id, &env.stores).await.unwrap();
        assert_eq!(summary.event_count, 0);
        assert_eq!(summary.total_donated, 0.0);
        assert!(summary.events.is_empty());
    }

    #[actix_rt::test]
    async fn donations_survive_event_deletion() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let p = env.user("Pat", "pat@example.com").await;
        let supper = sample_event(host.id);
        env.put_event(&supper).await;

        let dto = NewContributionDto {
            user_id: p.id,
            amount: 40.0,
            status: ContributionStatus::Success,
        };
        contribution::record(supper.id, &p, dto, &env.stores)
            .await
            .unwrap();
        event::delete(supper.id, &host, &env.stores).await.unwrap();

        assert_eq!(sum_participant_donations(p.id, &env.stores).await.unwrap(), 40.0);
        let kept = env
            .stores
            .contributions
            .find_by_user(p.id, Some(ContributionStatus::Success))
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].event_id, supper.id);
    }
}

