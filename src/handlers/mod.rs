pub mod contribution;
pub mod event;
pub mod invitation;
pub mod user;
pub mod voting;

use actix_web::web;

use crate::errors::ServiceError;

/// Malformed ids, bodies and query strings answer as validation errors.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ServiceError::validation(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ServiceError::validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ServiceError::validation(err.to_string()).into()),
    );
}

pub fn config(cfg: &mut web::ServiceConfig) {
    extractor_configs(cfg);
    cfg.service(
        web::scope("/events")
            .configure(event::init_routes)
            .configure(invitation::init_routes)
            .configure(voting::init_routes)
            .configure(contribution::init_routes),
    )
    .service(web::scope("/users").configure(user::init_routes));
}
