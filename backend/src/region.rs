use axum::extract::{Path, State};
use axum::Json;

use crate::app::AppState;
use crate::error::ApiError;
use crate::models::{Division, Region};

pub async fn list_regions(State(state): State<AppState>) -> Result<Json<Vec<Region>>, ApiError> {
    Ok(Json(state.store.list_regions().await?))
}

pub async fn list_divisions(
    State(state): State<AppState>,
    Path(region_id): Path<i32>,
) -> Result<Json<Vec<Division>>, ApiError> {
    state
        .store
        .get_region(region_id)
        .await?
        .ok_or(ApiError::NotFound("Region"))?;
    Ok(Json(state.store.list_divisions(region_id).await?))
}
