//! Chord progression generation runs, candidate ranking, and chord-event
//! CRUD with lock enforcement.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use reel_engine::progression::{generate_progression_candidates, ProgressionParams};
use reel_model::{ChordEvent, ChordProgressionCandidate, ChordProgressionRun, Store};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRunBody {
    pub project_id: Uuid,
    pub bars: u32,
    pub base_seed: i64,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_start_on")]
    pub start_on: String,
    #[serde(default = "default_true")]
    pub prefer_circle_motion: bool,
    #[serde(default = "default_true")]
    pub cadence_ending: bool,
    #[serde(default)]
    pub locked_bars: BTreeMap<u32, String>,
    #[serde(default = "default_chords_per_bar")]
    pub target_chords_per_bar: f64,
}

fn default_count() -> u32 {
    5
}
fn default_start_on() -> String {
    "I".to_string()
}
fn default_true() -> bool {
    true
}
fn default_chords_per_bar() -> f64 {
    1.0
}

pub async fn generate_run(
    State(state): State<AppState>,
    Json(body): Json<GenerateRunBody>,
) -> ApiResult<Json<ChordProgressionRun>> {
    let project = state.store.get_project(body.project_id)?;
    let tonic_pc = reel_theory::parse_tonic(&project.key_tonic)?;
    let mode: reel_theory::Mode = project.mode.into();
    let run_id = Uuid::new_v4();

    let params = ProgressionParams {
        tonic_pc,
        mode,
        bars: body.bars,
        seed: body.base_seed as u64,
        start_on: body.start_on,
        prefer_circle_motion: body.prefer_circle_motion,
        cadence_ending: body.cadence_ending,
    };
    let candidates = generate_progression_candidates(
        &params,
        &run_id.to_string(),
        body.base_seed,
        body.count,
        &body.locked_bars,
        body.target_chords_per_bar,
    );
    let mut candidates: Vec<ChordProgressionCandidate> = candidates
        .into_iter()
        .map(|c| ChordProgressionCandidate {
            candidate_index: c.candidate_index,
            seed_used: c.seed_used,
            roman_numerals: c.roman_numerals,
            score: c.score,
        })
        .collect();
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

    let run = ChordProgressionRun {
        id: run_id,
        project_id: body.project_id,
        base_seed: body.base_seed,
        requested_count: body.count,
        candidates,
        created_at: Utc::now(),
    };
    Ok(Json(state.store.record_chord_progression_run(run)))
}

pub async fn get_run(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<ChordProgressionRun>> {
    Ok(Json(state.store.get_chord_progression_run(id)?))
}

pub async fn get_chord_event(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<ChordEvent>> {
    Ok(Json(state.store.get_chord_event(id)?))
}

pub async fn list_chord_events(State(state): State<AppState>, Path(clip_id): Path<Uuid>) -> Json<Vec<ChordEvent>> {
    Json(state.store.list_chord_events_by_clip(clip_id))
}

#[derive(Deserialize)]
pub struct UpdateChordEventBody {
    #[serde(flatten)]
    pub event: ChordEvent,
    #[serde(default)]
    pub allow_unlock: bool,
}

pub async fn update_chord_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut body): Json<UpdateChordEventBody>,
) -> ApiResult<Json<ChordEvent>> {
    body.event.id = id;
    Ok(Json(state.store.update_chord_event(body.event, body.allow_unlock)?))
}

pub async fn insert_chord_event(
    State(state): State<AppState>,
    Json(event): Json<ChordEvent>,
) -> ApiResult<Json<ChordEvent>> {
    let clip_id = event.clip_id;
    let mut existing = state.store.list_chord_events_by_clip(clip_id);
    existing.push(event.clone());
    state.store.delete_then_insert_chord_events(clip_id, existing)?;
    Ok(Json(event))
}
