use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::NewContributionDto,
    errors::ServiceError,
    models::Actor,
    service::{self, AppState},
};

#[post("/{id}/contributions")]
pub async fn record(
    actor: Actor,
    event_id: web::Path<Uuid>,
    contribution_dto: web::Json<NewContributionDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let contribution = service::contribution::record(
        event_id.into_inner(),
        &actor,
        contribution_dto.into_inner(),
        &state.stores,
    )
    .await?;
    Ok(HttpResponse::Created().json(contribution))
}

#[get("/{id}/contributions")]
pub async fn get_for_event(
    actor: Actor,
    event_id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let contributions =
        service::contribution::list_for_event(event_id.into_inner(), &actor, &state.stores).await?;
    Ok(HttpResponse::Ok().json(contributions))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(record).service(get_for_event);
}
