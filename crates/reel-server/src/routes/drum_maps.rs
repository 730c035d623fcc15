//! Drum map profile CRUD.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use reel_model::{DrumMapProfile, Store};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_drum_map(
    State(state): State<AppState>,
    Json(profile): Json<DrumMapProfile>,
) -> ApiResult<Json<DrumMapProfile>> {
    Ok(Json(state.store.insert_drum_map(profile)?))
}

pub async fn get_drum_map(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<DrumMapProfile>> {
    Ok(Json(state.store.get_drum_map(id)?))
}

pub async fn list_drum_maps(State(state): State<AppState>) -> Json<Vec<DrumMapProfile>> {
    Json(state.store.list_drum_maps())
}
