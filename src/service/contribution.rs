use chrono::Utc;
use log::info;
use uuid::Uuid;

use crate::{
    db::Stores,
    dto::NewContributionDto,
    errors::{ServiceError, ServiceResult},
    models::{Actor, Contribution, ContributionStatus},
    service::event::get_by_id,
};

/// Stores a payment outcome. Only successful contributions move the
/// event's running total.
pub async fn record(
    event_id: Uuid,
    actor: &Actor,
    dto: NewContributionDto,
    stores: &Stores,
) -> ServiceResult<Contribution> {
    if dto.user_id != actor.id && !actor.is_admin() {
        return Err(ServiceError::forbidden(
            "contributions can only be recorded for yourself",
        ));
    }
    if !dto.amount.is_finite() || dto.amount <= 0.0 {
        return Err(ServiceError::validation("amount must be greater than 0"));
    }
    get_by_id(event_id, stores).await?;

    let contribution = Contribution {
        id: Uuid::new_v4(),
        event_id,
        user_id: dto.user_id,
        amount: dto.amount,
        status: dto.status,
        created_at: Utc::now(),
    };
    stores.contributions.create(&contribution).await?;
    if contribution.status == ContributionStatus::Success {
        stores
            .events
            .add_to_current_amount(event_id, contribution.amount)
            .await?;
    }
    info!(
        "contribution {} of {:.2} to event {} ({})",
        contribution.id,
        contribution.amount,
        event_id,
        contribution.status.as_str()
    );
    Ok(contribution)
}

pub async fn list_for_event(
    event_id: Uuid,
    actor: &Actor,
    stores: &Stores,
) -> ServiceResult<Vec<Contribution>> {
    let event = get_by_id(event_id, stores).await?;
    if !event.is_host(actor.id) && !actor.is_admin() {
        return Err(ServiceError::forbidden("only the host can list contributions"));
    }
    stores.contributions.find_by_event_id(event_id).await
}
