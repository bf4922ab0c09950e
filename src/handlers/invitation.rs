use actix_web::{post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::{InviteDto, InviteFormDto},
    errors::ServiceError,
    models::Actor,
    service::{self, AppState},
};

#[post("/{id}/invitations")]
pub async fn invite(
    actor: Actor,
    event_id: web::Path<Uuid>,
    invite_dto: web::Json<InviteDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service::invitation::invite_guest_by_email(
        event_id.into_inner(),
        &actor,
        &invite_dto.email,
        &state.stores,
        state.notifier.as_ref(),
        &state.config.public_base_url,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/{id}/invitations/form")]
pub async fn invite_from_form(
    actor: Actor,
    event_id: web::Path<Uuid>,
    form: web::Json<InviteFormDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service::invitation::invite_guest_by_form(
        event_id.into_inner(),
        &actor,
        &form,
        &state.stores,
        state.notifier.as_ref(),
        &state.config.public_base_url,
    )
    .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(invite).service(invite_from_form);
}
