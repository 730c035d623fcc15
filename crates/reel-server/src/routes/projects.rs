//! `/projects` and nested `/projects/{id}/...` routes.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use reel_model::{Project, Store, Track};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_project(State(state): State<AppState>, Json(project): Json<Project>) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.insert_project(project)?))
}

pub async fn list_projects(State(state): State<AppState>) -> Json<Vec<Project>> {
    Json(state.store.list_projects())
}

pub async fn get_project(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.get_project(id)?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut project): Json<Project>,
) -> ApiResult<Json<Project>> {
    project.id = id;
    Ok(Json(state.store.update_project(project)?))
}

pub async fn create_track(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(mut track): Json<Track>,
) -> ApiResult<Json<Track>> {
    state.store.get_project(project_id)?;
    track.project_id = project_id;
    Ok(Json(state.store.insert_track(track)?))
}

pub async fn list_tracks(State(state): State<AppState>, Path(project_id): Path<Uuid>) -> Json<Vec<Track>> {
    Json(state.store.list_tracks_by_project(project_id))
}

pub async fn get_track(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Track>> {
    Ok(Json(state.store.get_track(id)?))
}

#[derive(serde::Deserialize)]
pub struct MuteQuery {
    pub muted: bool,
}

pub async fn mute_track(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    axum::extract::Query(q): axum::extract::Query<MuteQuery>,
) -> ApiResult<Json<Track>> {
    let mut track = state.store.get_track(id)?;
    track.is_muted = q.muted;
    Ok(Json(state.store.update_track(track)?))
}
