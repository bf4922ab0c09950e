use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db::Stores,
    dto::NewStoryDto,
    errors::{ServiceError, ServiceResult},
    models::{Actor, Event, Story},
    service::event::get_by_id,
};

fn check_member(event: &Event, actor: &Actor) -> ServiceResult<()> {
    if event.is_host(actor.id) || event.is_guest(actor.id) {
        Ok(())
    } else {
        Err(ServiceError::forbidden("only the host and guests can access stories"))
    }
}

pub async fn add(
    event_id: Uuid,
    actor: &Actor,
    dto: NewStoryDto,
    stores: &Stores,
) -> ServiceResult<Story> {
    let event = get_by_id(event_id, stores).await?;
    check_member(&event, actor)?;
    if dto.title.trim().is_empty() {
        return Err(ServiceError::validation("title is required"));
    }
    if dto.recipient.name.trim().is_empty() {
        return Err(ServiceError::validation("recipient name is required"));
    }

    let story = Story {
        id: Uuid::new_v4(),
        event_id,
        title: dto.title,
        description: dto.description,
        nominator: dto.nominator,
        recipient: dto.recipient,
        created_at: Utc::now(),
    };
    stores.stories.create(&story).await?;
    info!("story {} nominated on event {} by {}", story.id, event_id, actor.id);
    Ok(story)
}

pub async fn list(event_id: Uuid, actor: &Actor, stores: &Stores) -> ServiceResult<Vec<Story>> {
    let event = get_by_id(event_id, stores).await?;
    check_member(&event, actor)?;
    stores.stories.find_by_event_id(event_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipient;
    use crate::test_utils::{sample_event, TestEnv};

    fn dto(title: &str) -> NewStoryDto {
        NewStoryDto {
            title: title.to_string(),
            description: "A family rebuilding after a fire".to_string(),
            nominator: "Gus".to_string(),
            recipient: Recipient {
                name: "The Okafors".to_string(),
                category_of_need: Some("Housing".to_string()),
                story: "Lost their home in March".to_string(),
                funds_usage: "Deposit on a new flat".to_string(),
            },
        }
    }

    #[actix_rt::test]
    async fn guests_nominate_and_read_stories() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let guest = env.user("Gus", "gus@example.com").await;
        let mut event = sample_event(host.id);
        event.guests.push(guest.id);
        env.put_event(&event).await;

        let first = add(event.id, &guest, dto("Fire"), &env.stores).await.unwrap();
        let second = add(event.id, &host, dto("Flood"), &env.stores).await.unwrap();

        let stories = list(event.id, &guest, &env.stores).await.unwrap();
        let ids: Vec<Uuid> = stories.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[actix_rt::test]
    async fn outsiders_and_blank_titles_are_rejected() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let stranger = env.user("Ugo", "ugo@example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;

        assert!(matches!(
            add(event.id, &stranger, dto("Fire"), &env.stores).await,
            Err(ServiceError::Forbidden { .. })
        ));
        assert!(matches!(
            list(event.id, &stranger, &env.stores).await,
            Err(ServiceError::Forbidden { .. })
        ));
        assert!(matches!(
            add(event.id, &host, dto("  "), &env.stores).await,
            Err(ServiceError::Validation { .. })
        ));
    }
}
