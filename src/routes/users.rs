use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, PageQuery, SearchQuery, SearchUsersResponse};
use crate::routes::{internal_error, AppState};

/// Configure all user directory routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/users", web::get().to(list_users))
        .route("/users/search", web::get().to(search_users))
        .route("/users/{user_id}", web::get().to(get_user));
}

/// Paginated user list
///
/// GET /api/v1/users?limit=20&offset=0
async fn list_users(state: web::Data<AppState>, query: web::Query<PageQuery>) -> impl Responder {
    let limit = query
        .limit
        .unwrap_or(state.matching.default_page_size)
        .min(state.matching.max_page_size);
    let offset = query.offset.unwrap_or(0);

    match state.users.list_users(limit, offset).await {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(e) => internal_error("Failed to list users", e),
    }
}

/// Keyword search
///
/// GET /api/v1/users/search?q=keyword&target=userName,skill
async fn search_users(state: web::Data<AppState>, query: web::Query<SearchQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors.to_string(), 400));
    }

    let targets = match query.targets() {
        Ok(targets) => targets,
        Err(message) => {
            return HttpResponse::BadRequest().json(ErrorResponse::new("Invalid target", message, 400));
        }
    };

    match state.users.search_by_keyword(&query.q, &targets).await {
        Ok(users) => HttpResponse::Ok().json(SearchUsersResponse {
            total_results: users.len(),
            users,
        }),
        Err(e) => internal_error("Failed to search users", e),
    }
}

/// Single user lookup
///
/// GET /api/v1/users/{userId}
async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let user_id = path.into_inner();

    match state.users.get_user(&user_id).await {
        Ok(Some(user)) => HttpResponse::Ok().json(user),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::new(
            "User not found",
            format!("No user with id {}", user_id),
            404,
        )),
        Err(e) => internal_error("Failed to fetch user", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchingSettings;
    use crate::models::SearchedUser;
    use crate::routes::configure_routes;
    use crate::services::{InMemoryStore, MemberRecord};
    use actix_web::{http::StatusCode, test, App};
    use std::sync::Arc;

    fn state() -> AppState {
        let store = InMemoryStore::with_users(vec![
            MemberRecord::new("u1", "Tanaka").skills(&["Rust"]),
            MemberRecord::new("u2", "Rustam"),
        ]);
        AppState::new(Arc::new(store), MatchingSettings::default())
    }

    #[actix_web::test]
    async fn test_search_users() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/users/search?q=rust&target=skill,userName")
            .to_request();
        let body: SearchUsersResponse = test::call_and_read_body_json(&app, req).await;

        let ids: Vec<&str> = body.users.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert_eq!(body.total_results, 2);
    }

    #[actix_web::test]
    async fn test_search_rejects_unknown_target() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/users/search?q=rust&target=nickname")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_list_and_get_user() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/users?limit=1").to_request();
        let users: Vec<SearchedUser> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(users.len(), 1);

        let req = test::TestRequest::get().uri("/api/v1/users/u2").to_request();
        let user: SearchedUser = test::call_and_read_body_json(&app, req).await;
        assert_eq!(user.user_name, "Rustam");

        let req = test::TestRequest::get().uri("/api/v1/users/ghost").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
