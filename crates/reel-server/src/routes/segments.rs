//! `/segments/generate`: generate one or more kinds of content across a
//! bar range in a single request.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reel_engine::orchestrator::{generate_segment, GenerationKind, SegmentRequest};
use reel_model::{Note, Store};

use crate::error::ApiResult;
use crate::routes::clips::GenerationKindWire;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateSegmentsBody {
    pub project_id: Uuid,
    pub clip_ids: Vec<Uuid>,
    pub seed: i64,
    pub kinds: Vec<GenerationKindWire>,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Serialize)]
pub struct SegmentOutcome {
    pub clip_id: Uuid,
    pub kind: &'static str,
    pub notes: Vec<Note>,
    pub sub_seed: u64,
}

fn kind_name(kind: GenerationKind) -> &'static str {
    match kind {
        GenerationKind::Drums => "drums",
        GenerationKind::Chords => "chords",
        GenerationKind::Melody => "melody",
        GenerationKind::Bass => "bass",
    }
}

pub async fn generate_segments(
    State(state): State<AppState>,
    Json(body): Json<GenerateSegmentsBody>,
) -> ApiResult<Json<Vec<SegmentOutcome>>> {
    let mut outcomes = Vec::new();
    for clip_id in &body.clip_ids {
        for kind_wire in &body.kinds {
            let kind: GenerationKind = match kind_wire {
                GenerationKindWire::Drums => GenerationKind::Drums,
                GenerationKindWire::Chords => GenerationKind::Chords,
                GenerationKindWire::Melody => GenerationKind::Melody,
                GenerationKindWire::Bass => GenerationKind::Bass,
            };
            let request = SegmentRequest {
                project_id: body.project_id,
                clip_id: *clip_id,
                kind,
                base_seed: body.seed,
                variation: 0.0,
                preview: body.preview,
            };
            let result = generate_segment(state.store.as_ref(), &request)?;
            outcomes.push(SegmentOutcome {
                clip_id: *clip_id,
                kind: kind_name(kind),
                notes: result.notes,
                sub_seed: result.sub_seed,
            });
        }
    }
    Ok(Json(outcomes))
}
