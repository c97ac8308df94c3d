use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, catalog,
    error::{AppError, AppResult},
    filters::{FilterState, parse_pairs},
    library::{self, LibraryChange, ReviewView},
    models::{ListKind, MediaType, Rating, ShowSummary, TitleSummary},
    profile::{self, ProfileListing, ProfileStats},
    users,
};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    username: String,
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let user = users::create(&state.db, &req.username).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": user.id, "username": user.username }))))
}

pub async fn import_movie(
    State(state): State<Arc<AppState>>,
    Json(req): Json<catalog::MovieImport>,
) -> AppResult<(StatusCode, Json<TitleSummary>)> {
    let movie = catalog::import_movie(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

pub async fn import_show(
    State(state): State<Arc<AppState>>,
    Json(req): Json<catalog::ShowImport>,
) -> AppResult<(StatusCode, Json<ShowSummary>)> {
    let show = catalog::import_show(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(show.into())))
}

/// Query parameters of the faceted profile listings.
#[derive(Debug)]
struct ListingParams {
    username: String,
    page: i64,
    include_facets: bool,
    filters: FilterState,
}

impl ListingParams {
    fn parse(query: &str) -> AppResult<Self> {
        let pairs = parse_pairs(query);
        let get = |key: &str| {
            pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.trim()).filter(|v| !v.is_empty())
        };

        let username =
            get("username").ok_or_else(|| AppError::bad_request("username is required"))?;
        let page = get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let include_facets = get("includeFacets") != Some("false");

        Ok(Self {
            username: username.to_string(),
            page,
            include_facets,
            filters: FilterState::decode(&pairs),
        })
    }
}

pub async fn watched_movies(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ProfileListing>> {
    profile_movies(&state, ListKind::Watched, query).await
}

pub async fn watchlist_movies(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> AppResult<Json<ProfileListing>> {
    profile_movies(&state, ListKind::Watchlist, query).await
}

async fn profile_movies(
    state: &AppState,
    list: ListKind,
    query: Option<String>,
) -> AppResult<Json<ProfileListing>> {
    let params = ListingParams::parse(query.as_deref().unwrap_or_default())?;
    let listing = profile::list_movies(
        &state.db,
        list,
        &params.username,
        &params.filters,
        params.page,
        params.include_facets,
    )
    .await?;
    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    username: Option<String>,
}

pub async fn profile_stats(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StatsQuery>,
) -> AppResult<Json<ProfileStats>> {
    let username = q
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::bad_request("username is required"))?;
    Ok(Json(profile::stats(&state.db, username).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleTarget {
    username: String,
    media_id: i32,
    media_type: MediaType,
}

pub async fn add_to_list(
    State(state): State<Arc<AppState>>,
    Path(list): Path<ListKind>,
    Json(req): Json<TitleTarget>,
) -> AppResult<Json<LibraryChange>> {
    let user = users::find_by_username(&state.db, &req.username).await?;
    let change = library::add(&state.db, user.id, list, req.media_id, req.media_type).await?;
    Ok(Json(change))
}

pub async fn remove_from_list(
    State(state): State<Arc<AppState>>,
    Path(list): Path<ListKind>,
    Json(req): Json<TitleTarget>,
) -> AppResult<StatusCode> {
    let user = users::find_by_username(&state.db, &req.username).await?;
    library::remove(&state.db, user.id, list, req.media_id, req.media_type).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    username: String,
    media_id: i32,
    media_type: MediaType,
    rating: f64,
    comment: Option<String>,
    #[serde(default)]
    is_public_utility: bool,
}

pub async fn save_review(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<Json<ReviewView>> {
    let rating = Rating::from_f64(req.rating).ok_or_else(|| {
        AppError::bad_request("rating must be between 0.5 and 5.0 in steps of 0.5")
    })?;
    let user = users::find_by_username(&state.db, &req.username).await?;
    let review = library::rate(
        &state.db,
        user.id,
        req.media_id,
        req.media_type,
        rating,
        req.comment,
        req.is_public_utility,
    )
    .await?;
    Ok(Json(review))
}

pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TitleTarget>,
) -> AppResult<StatusCode> {
    let user = users::find_by_username(&state.db, &req.username).await?;
    library::unrate(&state.db, user.id, req.media_id, req.media_type).await?;
    Ok(StatusCode::NO_CONTENT)
}
