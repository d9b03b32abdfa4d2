//! Feature-star routes.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use herald_common::error::AppError;
use herald_store::StarService;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/features/{id}/star", post(set_star))
        .route("/api/features/starred", get(list_starred))
}

#[derive(Debug, Deserialize)]
struct SetStarParams {
    email: String,
    #[serde(default = "default_starred")]
    starred: bool,
}

fn default_starred() -> bool {
    true
}

/// POST /api/features/:id/star — set or clear a star.
async fn set_star(
    State(state): State<AppState>,
    Path(feature_id): Path<i64>,
    Json(params): Json<SetStarParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    StarService::set_star(state.store.pool(), &params.email, feature_id, params.starred).await?;
    Ok(Json(json!({ "message": "Done" })))
}

#[derive(Debug, Deserialize)]
struct StarredQuery {
    email: String,
}

/// GET /api/features/starred?email= — ids of features the user starred.
async fn list_starred(
    State(state): State<AppState>,
    Query(query): Query<StarredQuery>,
) -> Result<Json<Vec<i64>>, AppError> {
    let ids = StarService::get_user_stars(state.store.pool(), &query.email).await?;
    Ok(Json(ids))
}
