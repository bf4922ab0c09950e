use actix_web::{get, post, web, HttpResponse};
use uuid::Uuid;

use crate::{
    dto::{NewStoryDto, VoteDto},
    errors::ServiceError,
    models::Actor,
    service::{self, AppState},
};

#[get("/{id}/stories")]
pub async fn get_stories(
    actor: Actor,
    event_id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let stories = service::story::list(event_id.into_inner(), &actor, &state.stores).await?;
    Ok(HttpResponse::Ok().json(stories))
}

#[post("/{id}/stories")]
pub async fn add_story(
    actor: Actor,
    event_id: web::Path<Uuid>,
    story_dto: web::Json<NewStoryDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let story = service::story::add(
        event_id.into_inner(),
        &actor,
        story_dto.into_inner(),
        &state.stores,
    )
    .await?;
    Ok(HttpResponse::Created().json(story))
}

/// Voters arrive through the emailed link and need no account.
#[post("/{id}/votes")]
pub async fn vote(
    event_id: web::Path<Uuid>,
    vote_dto: web::Json<VoteDto>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let vote = service::voting::submit_vote(
        event_id.into_inner(),
        &vote_dto,
        &state.stores,
        state.config.enforce_voter_eligibility,
    )
    .await?;
    Ok(HttpResponse::Created().json(vote))
}

#[get("/{id}/results")]
pub async fn get_results(
    actor: Actor,
    event_id: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServiceError> {
    let results =
        service::voting::compute_results(event_id.into_inner(), &actor, &state.stores).await?;
    Ok(HttpResponse::Ok().json(results))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_stories)
        .service(add_story)
        .service(vote)
        .service(get_results);
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    use crate::config::Config;
    use crate::service::auth::{jwt, AuthMiddleware};
    use crate::test_utils::{sample_event, TestEnv};

    use super::*;

    #[actix_rt::test]
    async fn nominate_vote_and_tally_over_http() {
        let env = TestEnv::new();
        let host = env.user("Hana", "hana@example.com").await;
        let event = sample_event(host.id);
        env.put_event(&event).await;
        let state = AppState {
            stores: env.stores.clone(),
            notifier: env.notifier.clone(),
            config: Config::for_tests(),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware::new("test-secret"))
                .configure(crate::handlers::config),
        )
        .await;
        let token = jwt::create(&host.id, host.role, 300, "test-secret").unwrap();
        let auth = ("Authorization", format!("Bearer {}", token));

        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/stories", event.id))
            .insert_header(auth.clone())
            .set_json(json!({
                "title": "A new roof",
                "description": "Storm damage before winter",
                "nominator": "Gus",
                "recipient": {
                    "name": "The Okafors",
                    "categoryOfNeed": "Housing",
                    "story": "Lost part of their roof in March",
                    "fundsUsage": "Roofing materials"
                }
            }))
            .to_request();
        let story: Value = test::call_and_read_body_json(&app, req).await;
        let story_id = story["id"].as_str().unwrap().to_string();

        let ballot = json!({ "storyId": story_id, "voterEmail": "Guest@Example.com" });
        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/votes", event.id))
            .set_json(&ballot)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri(&format!("/events/{}/votes", event.id))
            .set_json(&ballot)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri(&format!("/events/{}/results", event.id))
            .insert_header(auth)
            .to_request();
        let results: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(results["totalVotesCast"], 1);
        assert_eq!(results["results"][0]["votes"], 1);
        assert_eq!(results["results"][0]["status"], "Winner");
        assert_eq!(results["topCategory"], "Housing");
    }
}
