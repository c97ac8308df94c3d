#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use cinelog::{
    AppState,
    catalog::{self, CompanyRef, CreditImport, GenreRef, MovieImport, PersonRef},
    config::Config,
    db, library,
    models::{CrewRole, ListKind, MediaType, Rating},
    users,
};

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Config {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 1,
            request_timeout_secs: 30,
        };
        let db = db::connect_and_migrate(&config.database_url, config.db_max_connections)
            .await
            .expect("in-memory database");
        let state = Arc::new(AppState { config: Arc::new(config), db });
        let router = cinelog::router(state.clone());
        Self { state, router }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn user(&self, username: &str) -> i32 {
        users::create(&self.state.db, username).await.unwrap().id
    }

    pub async fn movie(&self, movie: MovieImport) -> i32 {
        catalog::import_movie(&self.state.db, movie).await.unwrap().id
    }

    pub async fn watch(&self, user_id: i32, movie_id: i32) {
        library::add(&self.state.db, user_id, ListKind::Watched, movie_id, MediaType::Movie)
            .await
            .unwrap();
    }

    pub async fn plan(&self, user_id: i32, movie_id: i32) {
        library::add(&self.state.db, user_id, ListKind::Watchlist, movie_id, MediaType::Movie)
            .await
            .unwrap();
    }

    pub async fn rate(&self, user_id: i32, movie_id: i32, stars: f64, public_utility: bool) {
        let rating = Rating::from_f64(stars).unwrap();
        library::rate(
            &self.state.db,
            user_id,
            movie_id,
            MediaType::Movie,
            rating,
            None,
            public_utility,
        )
        .await
        .unwrap();
    }
}

pub fn movie(id: i32, title: &str, release_date: &str) -> MovieImport {
    MovieImport {
        id,
        title: title.to_string(),
        release_date: Some(release_date.to_string()),
        runtime: Some(90 + id),
        ..Default::default()
    }
}

pub fn genre(id: i32, name: &str) -> GenreRef {
    GenreRef { id, name: name.to_string() }
}

pub fn company(id: i32, name: &str) -> CompanyRef {
    CompanyRef { id, name: name.to_string(), logo_path: None }
}

pub fn credit(id: i32, name: &str, role: CrewRole) -> CreditImport {
    CreditImport {
        person: PersonRef { id, name: name.to_string(), profile_path: None, popularity: None },
        role,
    }
}

/// Ids of the movies in a listing response, in order.
pub fn ids(body: &Value, key: &str) -> Vec<i64> {
    body[key].as_array().unwrap().iter().map(|m| m["id"].as_i64().unwrap()).collect()
}

/// `(id, count)` pairs of a facet dimension.
pub fn facet(body: &Value, dimension: &str) -> Vec<(i64, i64)> {
    body["facets"][dimension]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["id"].as_i64().unwrap(), e["count"].as_i64().unwrap()))
        .collect()
}
