use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{
    CreateMatchGroupRequest, ErrorResponse, MatchGroupConfig, MatchGroupListQuery, MatchGroupsResponse, StatusFilter,
};
use crate::routes::{internal_error, AppState};
use crate::services::MatchGroupError;

/// Configure all match-group routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/match-groups", web::post().to(create_match_group))
        .route("/match-groups/members/{user_id}", web::get().to(list_match_groups))
        .route("/match-groups/{match_group_id}", web::get().to(get_match_group));
}

/// Create match group endpoint
///
/// POST /api/v1/match-groups
///
/// Request body:
/// ```json
/// {
///   "ownerId": "string",
///   "matchGroupName": "string",
///   "description": "string",
///   "numOfMembers": 4,
///   "departmentFilter": "none|onlyMyDepartment|excludeMyDepartment",
///   "officeFilter": "none|onlyMyOffice|excludeMyOffice",
///   "skillFilter": ["string"],
///   "neverMatchedFilter": false
/// }
/// ```
async fn create_match_group(
    state: web::Data<AppState>,
    req: web::Json<CreateMatchGroupRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for create_match_group request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors.to_string(), 400));
    }

    if req.num_of_members > state.matching.max_members {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            format!("numOfMembers must be at most {}", state.matching.max_members),
            400,
        ));
    }

    let config = MatchGroupConfig::from(req.into_inner());

    match state.match_groups.check_skills_registered(&config.skill_filter).await {
        Ok(None) => {}
        Ok(Some(skill_name)) => {
            return HttpResponse::BadRequest().json(ErrorResponse::new(
                "Unknown skill",
                format!("Skill {} is not registered", skill_name),
                400,
            ));
        }
        Err(e) => return internal_error("Failed to check skills", e),
    }

    tracing::info!(
        "Creating match group for owner {} with {} members",
        config.owner_id,
        config.num_of_members
    );

    match state.match_groups.create_match_group(&config).await {
        Ok(Some(detail)) => HttpResponse::Created().json(detail),
        Ok(None) => HttpResponse::BadRequest().json(ErrorResponse::new(
            "Match group not created",
            "Not enough colleagues match the requested filters",
            400,
        )),
        Err(MatchGroupError::OwnerNotFound(owner_id)) => HttpResponse::NotFound().json(ErrorResponse::new(
            "Owner not found",
            format!("No user with id {}", owner_id),
            404,
        )),
        Err(e @ MatchGroupError::Persistence(_)) => internal_error("Failed to persist match group", e),
        Err(e) => internal_error("Failed to create match group", e),
    }
}

/// Match group detail endpoint
///
/// GET /api/v1/match-groups/{matchGroupId}
async fn get_match_group(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let match_group_id = path.into_inner();

    match state
        .match_groups
        .get_match_group_detail(&match_group_id, StatusFilter::All)
        .await
    {
        Ok(Some(detail)) => HttpResponse::Ok().json(detail),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new(
            "Match group not found",
            format!("No match group with id {}", match_group_id),
            404,
        )),
        Err(e) => internal_error("Failed to fetch match group", e),
    }
}

/// Match groups of a member
///
/// GET /api/v1/match-groups/members/{userId}?status=open|all
async fn list_match_groups(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<MatchGroupListQuery>,
) -> impl Responder {
    let user_id = path.into_inner();

    match state
        .match_groups
        .list_match_groups_for_user(&user_id, query.status)
        .await
    {
        Ok(match_groups) => HttpResponse::Ok().json(MatchGroupsResponse { match_groups }),
        Err(e) => internal_error("Failed to list match groups", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingSettings;
    use crate::models::{MatchGroupDetail, MatchGroupStatus};
    use crate::routes::configure_routes;
    use crate::services::{InMemoryStore, MemberRecord};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> AppState {
        let store = InMemoryStore::new();
        store.add_user(MemberRecord::new("u1", "Owner").office("o1", "Tokyo").department("d1", "Eng"));
        store.add_user(MemberRecord::new("u2", "Aoi").office("o1", "Tokyo").department("d1", "Eng"));
        store.add_user(MemberRecord::new("u3", "Ren").office("o2", "Osaka").department("d2", "Ops").skills(&["Go"]));
        let matching = MatchingSettings {
            rng_seed: Some(1),
            ..MatchingSettings::default()
        };
        AppState::new(Arc::new(store), matching)
    }

    fn body(num_of_members: usize, skills: &[&str]) -> serde_json::Value {
        json!({
            "ownerId": "u1",
            "matchGroupName": "lunch",
            "description": "",
            "numOfMembers": num_of_members,
            "skillFilter": skills,
        })
    }

    #[actix_web::test]
    async fn test_create_and_fetch() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/match-groups")
            .set_json(body(3, &[]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let created: MatchGroupDetail = test::read_body_json(resp).await;
        assert_eq!(created.members.len(), 3);
        assert_eq!(created.status, MatchGroupStatus::Open);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/match-groups/{}", created.match_group_id))
            .to_request();
        let fetched: MatchGroupDetail = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched.match_group_id, created.match_group_id);
    }

    #[actix_web::test]
    async fn test_unknown_skill_rejected() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/match-groups")
            .set_json(body(2, &["Go", "Cobol"]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let error: ErrorResponse = test::read_body_json(resp).await;
        assert!(error.message.contains("Cobol"));
    }

    #[actix_web::test]
    async fn test_infeasible_group_rejected() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/match-groups")
            .set_json(body(3, &["Go"]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_too_many_members_rejected() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/match-groups")
            .set_json(body(9, &[]))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_missing_group_is_404() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/match-groups/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
