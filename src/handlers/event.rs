use actix_web::{delete, get, post, put, web, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::{
    db::EventFilter,
    dto::{NewEventDto, PageQuery, StatusDto, UpdateEventDto},
    errors::ServiceError,
    models::Actor,
    service::{self, AppState},
};

#[get("")]
pub async fn get_all(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let page = service::event::list(EventFilter::Published, query.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/public")]
pub async fn get_public(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let filter = service::event::public_upcoming_filter();
    let page = service::event::list(filter, query.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/mine")]
pub async fn get_mine(
    actor: Actor,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let filter = EventFilter::Participant(actor.id);
    let page = service::event::list(filter, query.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/drafts")]
pub async fn get_drafts(
    actor: Actor,
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let filter = service::event::drafts_filter(&actor);
    let page = service::event::list(filter, query.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("")]
pub async fn create(
    actor: Actor,
    new_event_dto: web::Json<NewEventDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let event = service::event::create(&actor, new_event_dto.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Created().json(event))
}

#[get("/{id}")]
pub async fn get_by_id(
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let event = service::event::get_by_id(id.into_inner(), &state.stores).await?;
    Ok(HttpResponse::Ok().json(event))
}

#[put("/{id}")]
pub async fn update(
    actor: Actor,
    id: web::Path<Uuid>,
    update_event_dto: web::Json<UpdateEventDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let event = service::event::update(
        id.into_inner(),
        &actor,
        update_event_dto.into_inner(),
        &state.stores,
    )
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

#[delete("/{id}")]
pub async fn delete(
    actor: Actor,
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    service::event::delete(id, &actor, &state.stores).await?;
    info!("RESPONSE DELETE /events/{}", id);
    Ok(HttpResponse::NoContent().finish())
}

#[delete("/{id}/draft")]
pub async fn discard_draft(
    actor: Actor,
    id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    service::event::discard_draft(id.into_inner(), &actor, &state.stores).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[put("/{id}/status")]
pub async fn update_status(
    actor: Actor,
    id: web::Path<Uuid>,
    status_dto: web::Json<StatusDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let event = service::event::transition_status(
        id.into_inner(),
        &actor,
        &status_dto.status,
        &state.stores,
    )
    .await?;
    Ok(HttpResponse::Ok().json(event))
}

// static segments first, `/{id}` would swallow them
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_all)
        .service(get_public)
        .service(get_mine)
        .service(get_drafts)
        .service(create)
        .service(get_by_id)
        .service(update)
        .service(delete)
        .service(discard_draft)
        .service(update_status);
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App, ResponseError};
    use serde_json::{json, Value};

    use crate::models::Role;
    use crate::service::auth::{jwt, AuthMiddleware};
    use crate::test_utils::TestEnv;

    use super::*;

    fn app_state(env: &TestEnv) -> AppState {
        AppState {
            stores: env.stores.clone(),
            notifier: env.notifier.clone(),
            config: crate::config::Config::for_tests(),
        }
    }

    fn bearer(actor: &Actor) -> (String, String) {
        let token = jwt::create(&actor.id, actor.role, 300, "test-secret").unwrap();
        ("Authorization".to_string(), format!("Bearer {}", token))
    }

    #[actix_rt::test]
    async fn create_then_fetch_over_http() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(&env)))
                .wrap(AuthMiddleware::new("test-secret"))
                .configure(crate::handlers::config),
        )
        .await;

        let body = json!({
            "title": "Harvest Supper",
            "description": "Soup, bread and stories",
            "date": "2031-06-01",
            "time": "18:30",
            "location": "Community Hall",
            "guestCount": 10,
            "suggestedDonation": 50.0
        });
        let req = test::TestRequest::post()
            .uri("/events")
            .insert_header(bearer(&host))
            .set_json(&body)
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["status"], "upcoming");
        assert_eq!(created["isDraft"], false);
        assert_eq!(created["uniqueUrl"], format!("/events/{}", id));

        let req = test::TestRequest::get()
            .uri(&format!("/events/{}", id))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["title"], "Harvest Supper");
    }

    #[actix_rt::test]
    async fn errors_carry_status_and_message() {
        let env = TestEnv::new();
        let stranger = env.user_with_role("Ugo", "ugo@example.com", Role::User).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(&env)))
                .wrap(AuthMiddleware::new("test-secret"))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/events/drafts").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri(&format!("/events/{}", Uuid::new_v4()))
            .insert_header(bearer(&stranger))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "event not found");

        let req = test::TestRequest::get()
            .uri("/events")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let res = test::try_call_service(&app, req).await;
        let status = match res {
            Ok(res) => res.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn malformed_ids_bodies_and_queries_are_validation_errors() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state(&env)))
                .wrap(AuthMiddleware::new("test-secret"))
                .configure(crate::handlers::config),
        )
        .await;

        let requests = vec![
            test::TestRequest::get().uri("/events/not-a-uuid").to_request(),
            test::TestRequest::post()
                .uri(&format!("/events/{}/votes", Uuid::new_v4()))
                .set_json(json!({ "storyId": 5 }))
                .to_request(),
            test::TestRequest::get()
                .uri("/events?page=first")
                .to_request(),
            test::TestRequest::post()
                .uri("/events")
                .insert_header(bearer(&host))
                .set_json(json!({ "title": "No date" }))
                .to_request(),
        ];
        for req in requests {
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(res).await;
            assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
        }
    }
}
