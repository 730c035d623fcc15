//! `/clips/{id}` mutation and regeneration routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use reel_engine::orchestrator::{generate_segment, GenerationKind, SegmentRequest, SegmentResult};
use reel_model::{Clip, Note, Store};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn update_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut clip): Json<Clip>,
) -> ApiResult<Json<Clip>> {
    clip.id = id;
    Ok(Json(state.store.update_clip(clip)?))
}

#[derive(Deserialize)]
pub struct MuteQuery {
    pub muted: bool,
}

pub async fn mute_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<MuteQuery>,
) -> ApiResult<Json<Clip>> {
    let mut clip = state.store.get_clip(id)?;
    clip.is_muted = q.muted;
    Ok(Json(state.store.update_clip(clip)?))
}

#[derive(Deserialize)]
pub struct SoloQuery {
    pub soloed: bool,
}

pub async fn solo_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(q): Query<SoloQuery>,
) -> ApiResult<Json<Clip>> {
    let mut clip = state.store.get_clip(id)?;
    clip.is_soloed = q.soloed;
    Ok(Json(state.store.update_clip(clip)?))
}

pub async fn duplicate_clip(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Clip>> {
    let mut clip = state.store.get_clip(id)?;
    let notes = state.store.list_notes_by_clip(id);
    clip.id = Uuid::new_v4();
    let created = state.store.insert_clip(clip)?;
    let copied: Vec<Note> = notes.into_iter().map(|mut n| { n.id = Uuid::new_v4(); n.clip_id = created.id; n }).collect();
    state.store.delete_then_insert_notes(created.id, copied)?;
    Ok(Json(created))
}

#[derive(Deserialize)]
pub struct OffsetBody {
    pub bars: i64,
}

pub async fn offset_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<OffsetBody>,
) -> ApiResult<Json<Clip>> {
    let mut clip = state.store.get_clip(id)?;
    let track = state.store.get_track(clip.track_id)?;
    let project = state.store.get_project(track.project_id)?;
    let tpb = reel_engine::timebase::ticks_per_bar(project.time_signature_num, project.time_signature_den);
    clip.start_offset_ticks += body.bars * tpb;
    Ok(Json(state.store.update_clip(clip)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    Half,
    Double,
}

#[derive(Deserialize)]
pub struct TimeScaleBody {
    pub scale: TimeScale,
}

/// Halves or doubles every note's tick position and duration in place,
/// per the original's clip time-scale operation.
pub async fn time_scale_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TimeScaleBody>,
) -> ApiResult<Json<Vec<Note>>> {
    let clip = state.store.get_clip(id)?;
    let notes = state.store.list_notes_by_clip(id);
    let scaled: Vec<Note> = notes
        .into_iter()
        .map(|mut n| {
            match body.scale {
                TimeScale::Half => {
                    n.start_tick /= 2;
                    n.duration_tick = (n.duration_tick / 2).max(1);
                }
                TimeScale::Double => {
                    n.start_tick *= 2;
                    n.duration_tick *= 2;
                }
            }
            n
        })
        .collect();
    state.store.delete_then_insert_notes(clip.id, scaled.clone())?;
    Ok(Json(scaled))
}

#[derive(Deserialize)]
pub struct RegenerateBody {
    pub kind: GenerationKindWire,
    pub base_seed: i64,
    #[serde(default)]
    pub variation: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKindWire {
    Drums,
    Chords,
    Melody,
    Bass,
}

impl From<GenerationKindWire> for GenerationKind {
    fn from(w: GenerationKindWire) -> Self {
        match w {
            GenerationKindWire::Drums => GenerationKind::Drums,
            GenerationKindWire::Chords => GenerationKind::Chords,
            GenerationKindWire::Melody => GenerationKind::Melody,
            GenerationKindWire::Bass => GenerationKind::Bass,
        }
    }
}

#[derive(serde::Serialize)]
pub struct RegenerateResponse {
    pub notes: Vec<Note>,
    pub sub_seed: u64,
}

impl From<SegmentResult> for RegenerateResponse {
    fn from(r: SegmentResult) -> Self {
        Self { notes: r.notes, sub_seed: r.sub_seed }
    }
}

async fn regenerate(state: &AppState, clip_id: Uuid, body: RegenerateBody, preview: bool) -> ApiResult<Json<RegenerateResponse>> {
    let clip = state.store.get_clip(clip_id)?;
    let track = state.store.get_track(clip.track_id)?;
    let request = SegmentRequest {
        project_id: track.project_id,
        clip_id,
        kind: body.kind.into(),
        base_seed: body.base_seed,
        variation: body.variation,
        preview,
    };
    let result = generate_segment(state.store.as_ref(), &request)?;
    Ok(Json(result.into()))
}

pub async fn regenerate_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RegenerateBody>,
) -> ApiResult<Json<RegenerateResponse>> {
    regenerate(&state, id, body, false).await
}

pub async fn preview_regenerate_clip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RegenerateBody>,
) -> ApiResult<Json<RegenerateResponse>> {
    regenerate(&state, id, body, true).await
}
