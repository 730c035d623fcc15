//! Polyrhythm profile/lane CRUD and preview rendering.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use reel_engine::polyrhythm::{render_lanes_to_events, CycleSpec, LaneSpec};
use reel_model::{ClipPolyrhythmLane, PolyrhythmProfile, Store};

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_profile(
    State(state): State<AppState>,
    Json(profile): Json<PolyrhythmProfile>,
) -> ApiResult<Json<PolyrhythmProfile>> {
    Ok(Json(state.store.insert_polyrhythm_profile(profile)?))
}

pub async fn get_profile(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<PolyrhythmProfile>> {
    Ok(Json(state.store.get_polyrhythm_profile(id)?))
}

pub async fn list_profiles(State(state): State<AppState>) -> Json<Vec<PolyrhythmProfile>> {
    Json(state.store.list_polyrhythm_profiles())
}

pub async fn create_lane(
    State(state): State<AppState>,
    Json(lane): Json<ClipPolyrhythmLane>,
) -> ApiResult<Json<ClipPolyrhythmLane>> {
    Ok(Json(state.store.insert_lane(lane)?))
}

pub async fn list_lanes(State(state): State<AppState>, Path(clip_id): Path<Uuid>) -> Json<Vec<ClipPolyrhythmLane>> {
    Json(state.store.list_lanes_by_clip(clip_id))
}

#[derive(Deserialize)]
pub struct PreviewBody {
    pub profile: PolyrhythmProfile,
    pub clip_length_ticks: i64,
    pub pitch: u8,
    pub velocity: u8,
    pub seed: u64,
}

#[derive(serde::Serialize)]
pub struct PreviewNote {
    pub start_tick: i64,
    pub duration_tick: i64,
    pub pitch: u8,
    pub velocity: u8,
}

pub async fn preview_profile(Json(body): Json<PreviewBody>) -> Json<Vec<PreviewNote>> {
    let lane = LaneSpec {
        cycle: CycleSpec {
            steps: body.profile.steps,
            pulses: body.profile.pulses,
            cycle_beats: body.profile.cycle_beats,
            rotation: body.profile.rotation,
            swing: body.profile.swing,
        },
        pitch: body.pitch,
        velocity: body.velocity,
        mute: false,
        solo: false,
        order_index: 0,
        seed: body.seed,
        humanize_ticks: body.profile.humanize_ms.map(|ms| ms as i32).unwrap_or(0),
        duration_tick: (body.profile.cycle_beats * reel_engine::timebase::PPQ as f64 / body.profile.steps as f64) as i64,
    };
    let events = render_lanes_to_events(&[lane], 0, body.clip_length_ticks);
    Json(
        events
            .into_iter()
            .map(|e| PreviewNote {
                start_tick: e.start_tick,
                duration_tick: e.duration_tick,
                pitch: e.pitch,
                velocity: e.velocity,
            })
            .collect(),
    )
}

#[derive(Deserialize)]
pub struct PreviewLanesBody {
    pub clip_id: Uuid,
    pub clip_length_ticks: i64,
}

pub async fn preview_lanes(
    State(state): State<AppState>,
    Json(body): Json<PreviewLanesBody>,
) -> ApiResult<Json<Vec<PreviewNote>>> {
    let lanes_model = state.store.list_lanes_by_clip(body.clip_id);
    let mut specs = Vec::with_capacity(lanes_model.len());
    for lane in &lanes_model {
        let profile = state.store.get_polyrhythm_profile(lane.polyrhythm_profile_id)?;
        specs.push(LaneSpec {
            cycle: CycleSpec {
                steps: profile.steps,
                pulses: profile.pulses,
                cycle_beats: profile.cycle_beats,
                rotation: profile.rotation,
                swing: profile.swing,
            },
            pitch: lane.pitch,
            velocity: lane.velocity,
            mute: lane.mute,
            solo: lane.solo,
            order_index: lane.order_index,
            seed: lane.seed_offset,
            humanize_ticks: profile.humanize_ms.map(|ms| ms as i32).unwrap_or(0),
            duration_tick: (profile.cycle_beats * reel_engine::timebase::PPQ as f64 / profile.steps as f64) as i64,
        });
    }
    let events = render_lanes_to_events(&specs, 0, body.clip_length_ticks);
    Ok(Json(
        events
            .into_iter()
            .map(|e| PreviewNote {
                start_tick: e.start_tick,
                duration_tick: e.duration_tick,
                pitch: e.pitch,
                velocity: e.velocity,
            })
            .collect(),
    ))
}
