use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use common::errors::AppError;
use common::models::{City, ThemePreference};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

use crate::assets::OfflineAssetStore;
use crate::db::SqliteKvStore;
use crate::geocoder::{CitySearch, SearchOutcome, Suggestion};
use crate::orchestrator::{Orchestrator, RefreshOutcome, SelectOutcome};
use crate::view::{ViewSnapshot, ViewState};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator<SqliteKvStore>>,
    pub search: Arc<CitySearch>,
    pub view: Arc<ViewState>,
    pub assets: Arc<OfflineAssetStore>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub superseded: bool,
    pub results: Vec<Suggestion>,
}

#[derive(Serialize, ToSchema)]
pub struct SelectResponse {
    pub outcome: SelectOutcome,
    pub view: ViewSnapshot,
}

#[derive(Serialize, ToSchema)]
pub struct RefreshResponse {
    pub outcome: RefreshOutcome,
    pub view: ViewSnapshot,
}

#[derive(Serialize, ToSchema)]
pub struct ThemeResponse {
    pub theme: ThemePreference,
}

#[derive(Deserialize, ToSchema)]
pub struct ConnectivityRequest {
    pub online: bool,
}

fn validate_city(city: &City) -> Result<(), AppError> {
    if city.name.trim().is_empty() {
        return Err(AppError::validation("City name must not be empty"));
    }
    if !(-90.0..=90.0).contains(&city.lat) || !(-180.0..=180.0).contains(&city.lon) {
        return Err(AppError::validation(format!(
            "Coordinates out of range: {}, {}",
            city.lat, city.lon
        )));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "sun-service" }))
}

#[utoipa::path(
    get,
    path = "/api/cities/search",
    params(
        ("q" = String, Query, description = "Free-text city query")
    ),
    responses(
        (status = 200, description = "Candidate cities, or a superseded marker", body = SearchResponse)
    ),
    tag = "cities"
)]
pub async fn search_cities(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    let response = match state.search.search(&params.q).await {
        SearchOutcome::Suggestions(results) => SearchResponse {
            query: params.q,
            superseded: false,
            results,
        },
        SearchOutcome::Superseded => SearchResponse {
            query: params.q,
            superseded: true,
            results: Vec::new(),
        },
    };

    Json(response)
}

#[utoipa::path(
    post,
    path = "/api/cities/select",
    request_body = City,
    responses(
        (status = 200, description = "City selected", body = SelectResponse),
        (status = 400, description = "Invalid city")
    ),
    tag = "cities"
)]
pub async fn select_city(
    State(state): State<AppState>,
    Json(city): Json<City>,
) -> Result<Json<SelectResponse>, AppError> {
    validate_city(&city)?;
    info!(city = %city.name, "City selection received");

    let outcome = state.orchestrator.select_city(city).await;

    Ok(Json(SelectResponse {
        outcome,
        view: state.view.snapshot(Utc::now()),
    }))
}

#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "Refresh finished", body = RefreshResponse),
        (status = 400, description = "No city selected"),
        (status = 503, description = "No usable day could be fetched")
    ),
    tag = "sun"
)]
pub async fn refresh(State(state): State<AppState>) -> Result<Json<RefreshResponse>, AppError> {
    info!("Refresh requested");

    let outcome = state.orchestrator.refresh().await?;

    Ok(Json(RefreshResponse {
        outcome,
        view: state.view.snapshot(Utc::now()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/view",
    responses(
        (status = 200, description = "Current widget state", body = ViewSnapshot)
    ),
    tag = "sun"
)]
pub async fn get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.view.snapshot(Utc::now()))
}

#[utoipa::path(
    get,
    path = "/api/recent",
    responses(
        (status = 200, description = "Recently selected cities", body = Vec<City>)
    ),
    tag = "cities"
)]
pub async fn get_recent(State(state): State<AppState>) -> Result<Json<Vec<City>>, AppError> {
    Ok(Json(state.orchestrator.store().list_recent().await?))
}

#[utoipa::path(
    get,
    path = "/api/theme",
    responses(
        (status = 200, description = "Stored theme", body = ThemeResponse)
    ),
    tag = "preferences"
)]
pub async fn get_theme(State(state): State<AppState>) -> Result<Json<ThemeResponse>, AppError> {
    let theme = state.orchestrator.store().get_theme().await?;
    Ok(Json(ThemeResponse { theme }))
}

#[utoipa::path(
    post,
    path = "/api/theme/toggle",
    responses(
        (status = 200, description = "Theme switched", body = ThemeResponse)
    ),
    tag = "preferences"
)]
pub async fn toggle_theme(State(state): State<AppState>) -> Result<Json<ThemeResponse>, AppError> {
    let theme = state.orchestrator.toggle_theme().await?;
    Ok(Json(ThemeResponse { theme }))
}

#[utoipa::path(
    put,
    path = "/api/connectivity",
    request_body = ConnectivityRequest,
    responses(
        (status = 200, description = "Connectivity recorded", body = ViewSnapshot)
    ),
    tag = "sun"
)]
pub async fn set_connectivity(
    State(state): State<AppState>,
    Json(request): Json<ConnectivityRequest>,
) -> Json<ViewSnapshot> {
    state.orchestrator.set_online(request.online);
    Json(state.view.snapshot(Utc::now()))
}

pub async fn serve_index(State(state): State<AppState>) -> Result<Response, AppError> {
    serve(&state, "./").await
}

pub async fn serve_asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    serve(&state, &path).await
}

async fn serve(state: &AppState, path: &str) -> Result<Response, AppError> {
    let asset = state.assets.fetch(path).await?;
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.body).into_response())
}
