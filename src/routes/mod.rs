// Route exports
pub mod match_groups;
pub mod users;

use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

use crate::config::MatchingSettings;
use crate::models::{ErrorResponse, HealthResponse};
use crate::services::{DirectoryStore, MatchGroupService, UserDirectory};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DirectoryStore>,
    pub match_groups: Arc<MatchGroupService>,
    pub users: Arc<UserDirectory>,
    pub matching: MatchingSettings,
}

impl AppState {
    pub fn new(store: Arc<dyn DirectoryStore>, matching: MatchingSettings) -> Self {
        Self {
            match_groups: Arc::new(MatchGroupService::new(store.clone(), matching.rng_seed)),
            users: Arc::new(UserDirectory::new(store.clone())),
            store,
            matching,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(match_groups::configure)
            .configure(users::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.store.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

pub(crate) fn internal_error(error: &str, e: impl std::fmt::Display) -> HttpResponse {
    tracing::error!("{}: {}", error, e);
    HttpResponse::InternalServerError().json(ErrorResponse::new(error, e.to_string(), 500))
}
