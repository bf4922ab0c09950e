use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::db::memory::{MemoryNotifier, MemoryStore};
use crate::db::Stores;
use crate::dto::NewEventDto;
use crate::models::{unique_url_for, Actor, Event, EventStatus, Role, User};

pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn sample_event(host_id: Uuid) -> Event {
    let id = Uuid::new_v4();
    Event {
        id,
        title: "Harvest Supper".to_string(),
        description: "Soup, bread and stories".to_string(),
        date: NaiveDate::from_ymd_opt(2031, 6, 1).expect("valid date"),
        time: "18:30".to_string(),
        location: "Community Hall".to_string(),
        guest_count: 10,
        suggested_donation: Some(50.0),
        image_url: None,
        is_public: true,
        is_draft: false,
        unique_url: unique_url_for(&id),
        status: EventStatus::Upcoming,
        goal_amount: 1000.0,
        current_amount: 0.0,
        host_id,
        guests: Vec::new(),
        invited_emails: Vec::new(),
        created_at: Utc::now(),
    }
}

pub(crate) fn new_event_dto() -> NewEventDto {
    NewEventDto {
        title: "Harvest Supper".to_string(),
        description: "Soup, bread and stories".to_string(),
        date: NaiveDate::from_ymd_opt(2031, 6, 1).expect("valid date"),
        time: "18:30".to_string(),
        location: "Community Hall".to_string(),
        guest_count: 10,
        suggested_donation: Some(50.0),
        image_url: None,
        is_public: Some(true),
        is_draft: None,
        goal_amount: Some(1000.0),
    }
}

pub(crate) struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub stores: Stores,
    pub notifier: Arc<MemoryNotifier>,
}

impl TestEnv {
    pub fn new() -> Self {
        init_test_logger();
        let store = Arc::new(MemoryStore::new());
        Self {
            stores: Stores::in_memory(store.clone()),
            store,
            notifier: Arc::new(MemoryNotifier::new()),
        }
    }

    /// Registers a user and returns the matching actor.
    pub async fn user(&self, name: &str, email: &str) -> Actor {
        self.user_with_role(name, email, Role::User).await
    }

    pub async fn user_with_role(&self, name: &str, email: &str, role: Role) -> Actor {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            events: Vec::new(),
        };
        let actor = Actor::new(user.id, role);
        self.store.insert_user(user).await;
        actor
    }

    /// Stores `event` as-is, bypassing the lifecycle checks.
    pub async fn put_event(&self, event: &Event) {
        self.stores.events.create(event).await.expect("memory insert");
    }
}
