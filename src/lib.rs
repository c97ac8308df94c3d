pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod facets;
pub mod filters;
pub mod library;
pub mod models;
pub mod pagination;
pub mod predicate;
pub mod profile;
pub mod routes;
pub mod sql;
pub mod users;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
}

pub fn router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/users", post(routes::create_user))
        .route("/api/catalog/movies", post(routes::import_movie))
        .route("/api/catalog/shows", post(routes::import_show))
        .route("/api/profile/watched/movies", get(routes::watched_movies))
        .route("/api/profile/watchlist/movies", get(routes::watchlist_movies))
        .route("/api/profile/stats", get(routes::profile_stats))
        .route(
            "/api/library/{list}",
            post(routes::add_to_list).delete(routes::remove_from_list),
        )
        .route("/api/reviews", put(routes::save_review).delete(routes::delete_review))
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
