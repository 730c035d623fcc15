//! `/projects/{id}/export/{midi,zip,json}`.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reel_midi::{export_project, export_project_to_zip, SplitBy};
use reel_model::{Clip, Note, Project, Store, Track};

use crate::error::ApiResult;
use crate::state::AppState;

fn all_clips(store: &dyn Store, tracks: &[Track]) -> Vec<Clip> {
    tracks.iter().flat_map(|t| store.list_clips_by_track(t.id)).collect()
}

fn notes_for(store: &dyn Store) -> impl Fn(&Clip) -> Vec<Note> + '_ {
    move |clip: &Clip| store.list_notes_by_clip(clip.id)
}

pub async fn export_midi(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Response> {
    let project = state.store.get_project(id)?;
    let tracks = state.store.list_tracks_by_project(id);
    let clips = all_clips(state.store.as_ref(), &tracks);
    let bytes = export_project(&project, &tracks, &clips, notes_for(state.store.as_ref()))?;
    Ok((
        [(header::CONTENT_TYPE, "audio/midi")],
        bytes,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct SplitByQuery {
    #[serde(default = "default_split")]
    pub split_by: String,
}

fn default_split() -> String {
    "track".to_string()
}

pub async fn export_zip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<SplitByQuery>,
) -> ApiResult<Response> {
    let project = state.store.get_project(id)?;
    let tracks = state.store.list_tracks_by_project(id);
    let clips = all_clips(state.store.as_ref(), &tracks);
    let split_by = if q.split_by == "clip" { SplitBy::Clip } else { SplitBy::Track };
    let bytes = export_project_to_zip(&project, &tracks, &clips, notes_for(state.store.as_ref()), split_by)?;
    Ok(([(header::CONTENT_TYPE, "application/zip")], bytes).into_response())
}

#[derive(Serialize)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub tracks: Vec<Track>,
    pub clips: Vec<Clip>,
    pub notes: Vec<Note>,
}

pub async fn export_json(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<axum::Json<ProjectSnapshot>> {
    let project = state.store.get_project(id)?;
    let tracks = state.store.list_tracks_by_project(id);
    let clips = all_clips(state.store.as_ref(), &tracks);
    let notes: Vec<Note> = clips.iter().flat_map(|c| state.store.list_notes_by_clip(c.id)).collect();
    Ok(axum::Json(ProjectSnapshot { project, tracks, clips, notes }))
}
