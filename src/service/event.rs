use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

use crate::{
    db::{EventFilter, Stores},
    dto::{NewEventDto, PageQuery, Paginated, Pagination, UpdateEventDto},
    errors::{ServiceError, ServiceResult},
    models::{unique_url_for, Actor, Event, EventStatus},
};

pub const MIN_GUESTS: i32 = 2;
pub const MAX_GUESTS: i32 = 500;
pub const MIN_DONATION: f64 = 25.0;
pub const MAX_DONATION: f64 = 10_000.0;
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 100;

const DRAFT_STATUS_MESSAGE: &str = "drafts can only be cancelled";
const UNDRAFT_MESSAGE: &str = "a published event cannot be turned back into a draft";

fn validate_guest_count(guest_count: i32) -> ServiceResult<()> {
    if !(MIN_GUESTS..=MAX_GUESTS).contains(&guest_count) {
        return Err(ServiceError::validation(format!(
            "guestCount must be between {} and {}",
            MIN_GUESTS, MAX_GUESTS
        )));
    }
    Ok(())
}

fn validate_suggested_donation(amount: Option<f64>) -> ServiceResult<()> {
    match amount {
        Some(v) if !v.is_finite() || v < MIN_DONATION || v > MAX_DONATION => {
            Err(ServiceError::validation(format!(
                "suggestedDonation must be between {} and {}",
                MIN_DONATION, MAX_DONATION
            )))
        }
        _ => Ok(()),
    }
}

fn validate_goal_amount(amount: Option<f64>) -> ServiceResult<()> {
    match amount {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(ServiceError::validation("goalAmount must not be negative"))
        }
        _ => Ok(()),
    }
}

fn require_text(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(())
}

pub async fn create(actor: &Actor, dto: NewEventDto, stores: &Stores) -> ServiceResult<Event> {
    require_text("title", &dto.title)?;
    require_text("location", &dto.location)?;
    validate_guest_count(dto.guest_count)?;
    validate_suggested_donation(dto.suggested_donation)?;
    validate_goal_amount(dto.goal_amount)?;

    let id = Uuid::new_v4();
    let event = Event {
        id,
        title: dto.title,
        description: dto.description,
        date: dto.date,
        time: dto.time,
        location: dto.location,
        guest_count: dto.guest_count,
        suggested_donation: dto.suggested_donation,
        image_url: dto.image_url,
        is_public: dto.is_public.unwrap_or(false),
        is_draft: dto.is_draft.unwrap_or(false),
        unique_url: unique_url_for(&id),
        status: EventStatus::Upcoming,
        goal_amount: dto.goal_amount.unwrap_or(0.0),
        current_amount: 0.0,
        host_id: actor.id,
        guests: Vec::new(),
        invited_emails: Vec::new(),
        created_at: Utc::now(),
    };
    stores.events.create(&event).await?;
    stores.users.push_event(actor.id, event.id).await?;
    info!(
        "event {} created by {} (draft: {})",
        event.id, actor.id, event.is_draft
    );
    Ok(event)
}

pub async fn get_by_id(id: Uuid, stores: &Stores) -> ServiceResult<Event> {
    stores
        .events
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("event not found"))
}

pub async fn update(
    id: Uuid,
    actor: &Actor,
    dto: UpdateEventDto,
    stores: &Stores,
) -> ServiceResult<Event> {
    let event = get_by_id(id, stores).await?;
    if !event.is_host(actor.id) && !actor.is_admin() {
        warn!("user {} tried to update event {}", actor.id, id);
        return Err(ServiceError::forbidden("only the host can update this event"));
    }
    if let Some(title) = &dto.title {
        require_text("title", title)?;
    }
    if let Some(location) = &dto.location {
        require_text("location", location)?;
    }
    if let Some(guest_count) = dto.guest_count {
        validate_guest_count(guest_count)?;
    }
    validate_suggested_donation(dto.suggested_donation)?;
    validate_goal_amount(dto.goal_amount)?;
    if !event.is_draft && dto.is_draft == Some(true) {
        return Err(ServiceError::invalid_state(UNDRAFT_MESSAGE));
    }

    let changed = dto.field_count();
    if changed == 0 {
        debug!("update of event {} carried no fields", id);
        return Ok(event);
    }
    match stores.events.update_fields(id, &dto).await? {
        Some(updated) => {
            info!("event {} updated by {} ({} fields)", id, actor.id, changed);
            Ok(updated)
        }
        // published or deleted since the read above
        None => {
            get_by_id(id, stores).await?;
            Err(ServiceError::invalid_state(UNDRAFT_MESSAGE))
        }
    }
}

pub async fn discard_draft(id: Uuid, actor: &Actor, stores: &Stores) -> ServiceResult<()> {
    let event = get_by_id(id, stores).await?;
    if !event.is_host(actor.id) {
        return Err(ServiceError::forbidden("only the host can discard this draft"));
    }
    if !event.is_draft {
        return Err(ServiceError::invalid_state("only drafts can be discarded"));
    }
    if !stores.events.delete_by_id(id).await? {
        return Err(ServiceError::not_found("event not found"));
    }
    stores.users.pull_event(event.host_id, id).await?;
    info!("draft {} discarded by {}", id, actor.id);
    Ok(())
}

pub async fn transition_status(
    id: Uuid,
    actor: &Actor,
    new_status: &str,
    stores: &Stores,
) -> ServiceResult<Event> {
    let event = get_by_id(id, stores).await?;
    if !event.is_host(actor.id) {
        return Err(ServiceError::forbidden("only the host can change the status"));
    }
    let status: EventStatus = new_status.parse()?;
    if event.is_draft && status != EventStatus::Cancelled {
        return Err(ServiceError::invalid_state(DRAFT_STATUS_MESSAGE));
    }
    match stores.events.set_status(id, status).await? {
        Some(updated) => {
            info!("event {} status {} -> {}", id, event.status, status);
            Ok(updated)
        }
        // turned into a draft or deleted since the read above
        None => {
            get_by_id(id, stores).await?;
            Err(ServiceError::invalid_state(DRAFT_STATUS_MESSAGE))
        }
    }
}

pub async fn delete(id: Uuid, actor: &Actor, stores: &Stores) -> ServiceResult<()> {
    let event = get_by_id(id, stores).await?;
    if !event.is_host(actor.id) && !actor.is_admin() {
        return Err(ServiceError::forbidden("only the host can delete this event"));
    }
    if !stores.events.delete_by_id(id).await? {
        return Err(ServiceError::not_found("event not found"));
    }
    stores.users.pull_event(event.host_id, id).await?;
    info!("event {} deleted by {}", id, actor.id);
    Ok(())
}

pub fn public_upcoming_filter() -> EventFilter {
    EventFilter::PublicUpcoming {
        from: Utc::now().date_naive(),
    }
}

/// Admins see every draft, everyone else only their own. Both are paginated.
pub fn drafts_filter(actor: &Actor) -> EventFilter {
    if actor.is_admin() {
        EventFilter::Drafts { host: None }
    } else {
        EventFilter::Drafts {
            host: Some(actor.id),
        }
    }
}

pub async fn list(
    filter: EventFilter,
    query: PageQuery,
    stores: &Stores,
) -> ServiceResult<Paginated<Event>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let skip = (page - 1)
        .checked_mul(limit)
        .filter(|skip| *skip <= i64::MAX as u64)
        .ok_or_else(|| ServiceError::validation("page out of range"))?;

    let total_items = stores.events.count(&filter).await?;
    let items = stores.events.find(&filter, skip, limit).await?;
    Ok(Paginated {
        items,
        pagination: Pagination {
            current_page: page,
            total_pages: (total_items + limit - 1) / limit,
            total_items,
            limit,
        },
    })
}
