use actix_web::{get, web, HttpResponse};
use log::debug;

use crate::{
    errors::ServiceError,
    models::Actor,
    service::{self, AppState},
};

#[get("/me/participation")]
pub async fn get_participation(
    actor: Actor,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let summary = service::participation::summary(actor.id, &state.stores).await?;
    debug!(
        "participation of {}: {} events, {:.2} donated",
        actor.id, summary.event_count, summary.total_donated
    );
    Ok(HttpResponse::Ok().json(summary))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_participation);
}
