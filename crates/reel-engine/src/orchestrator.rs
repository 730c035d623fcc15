//! Binds generators to clips: derives a deterministic sub-seed from
//! `(project, clip, kind, bar)`-scoped context, invokes the matching
//! generator, and (for chords) renders the resulting chord events into
//! audition notes via the chord renderer.
//!
//! Grounded on `services/generation.py::GenerationService`.

use reel_model::{
    ChordEvent, Clip, ClipParams, CompPattern, Note, PatternType, Project, StrumCurve, StrumDirection, Store,
    VelocityCurve, Voicing,
};
use uuid::Uuid;

use crate::bass::{generate_bassline, BassParams};
use crate::chord_render::{render_chord_event_to_notes, voice_chord};
use crate::drums::{generate_drum_pattern, DrumParams, DrumStyle, HatMode, PauseScope};
use crate::melody::{generate_melody, MelodyParams};
use crate::progression::{generate_progression, ProgressionParams};
use crate::timebase::ticks_per_bar;
use crate::GeneratedNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationKind {
    Drums,
    Chords,
    Melody,
    Bass,
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Model(#[from] reel_model::ModelError),
    #[error(transparent)]
    Theory(#[from] reel_theory::TheoryError),
    #[error("generation produced no candidates satisfying the request: {0}")]
    GenerationFailure(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

pub struct SegmentRequest {
    pub project_id: Uuid,
    pub clip_id: Uuid,
    pub kind: GenerationKind,
    pub base_seed: i64,
    pub variation: f64,
    pub preview: bool,
}

pub struct SegmentResult {
    pub notes: Vec<Note>,
    pub chord_events: Vec<ChordEvent>,
    pub sub_seed: u64,
}

fn sub_seed(project_id: Uuid, clip_id: Uuid, kind: GenerationKind, base_seed: i64, variation: f64) -> u64 {
    let kind_str = match kind {
        GenerationKind::Drums => "drums",
        GenerationKind::Chords => "chords",
        GenerationKind::Melody => "melody",
        GenerationKind::Bass => "bass",
    };
    reel_rng::stable_hash_parts(&[
        &project_id.to_string(),
        &clip_id.to_string(),
        kind_str,
        &base_seed.to_string(),
        &variation.to_string(),
    ])
}

fn to_model_note(clip_id: Uuid, generated: &GeneratedNote) -> Note {
    Note {
        id: Uuid::new_v4(),
        clip_id,
        pitch: generated.pitch,
        velocity: generated.velocity.max(1),
        start_tick: generated.start_tick.max(0),
        duration_tick: generated.duration_tick.max(1),
        probability: 1.0,
    }
}

/// Default per-event rendering parameters applied to freshly generated
/// chord progressions, before any caller customization.
fn default_chord_event(clip_id: Uuid, roman: &str, chord_name: &str, start_tick: i64, duration_tick: i64) -> ChordEvent {
    ChordEvent {
        id: Uuid::new_v4(),
        clip_id,
        start_tick,
        duration_tick,
        duration_beats: duration_tick as f64 / crate::timebase::PPQ as f64,
        roman_numeral: roman.to_string(),
        chord_name: chord_name.to_string(),
        intensity: 1.0,
        voicing: Voicing::Root,
        inversion: 0,
        strum_beats: 0.0,
        humanize_beats: 0.0,
        offset_beats: 0.0,
        pattern_type: PatternType::Block,
        duration_gate: 0.85,
        velocity_curve: VelocityCurve::Flat,
        strum_direction: StrumDirection::Down,
        strum_spread: 1.0,
        strum_curve: StrumCurve::Linear,
        comp_pattern: None::<CompPattern>,
        hit_params: None,
        retrigger: true,
        velocity_jitter: 0,
        timing_jitter_ms: 0.0,
        is_enabled: true,
        is_locked: false,
        grid_quantum: None,
        strum_ms: None,
        humanize_ms: None,
    }
}

/// Generate (and, unless previewing, commit) content for one segment.
#[tracing::instrument(skip(store), fields(project_id = %request.project_id, clip_id = %request.clip_id))]
pub fn generate_segment(store: &dyn Store, request: &SegmentRequest) -> Result<SegmentResult> {
    let project = store.get_project(request.project_id)?;
    let clip = store.get_clip(request.clip_id)?;
    let tpb = ticks_per_bar(project.time_signature_num, project.time_signature_den);
    let tonic_pc = reel_theory::parse_tonic(&project.key_tonic)?;
    let mode: reel_theory::Mode = project.mode.into();
    let seed = sub_seed(request.project_id, request.clip_id, request.kind, request.base_seed, request.variation);

    let (notes, chord_events) = match request.kind {
        GenerationKind::Drums => (generate_drum_notes(&clip, seed, request.variation)?, Vec::new()),
        GenerationKind::Melody => (generate_melody_notes(&clip, tonic_pc, mode, seed)?, Vec::new()),
        GenerationKind::Bass => (Vec::new(), Vec::new()),
        GenerationKind::Chords => generate_chord_notes(&clip, tonic_pc, mode, seed, tpb)?,
    };

    let bass_notes = if request.kind == GenerationKind::Bass {
        generate_bass_notes(store, &clip, tonic_pc, mode, seed, tpb)?
    } else {
        Vec::new()
    };
    let notes = if bass_notes.is_empty() { notes } else { bass_notes };

    if !request.preview {
        store.delete_then_insert_notes(clip.id, notes.clone())?;
        if request.kind == GenerationKind::Chords {
            store.delete_then_insert_chord_events(clip.id, chord_events.clone())?;
        }
        tracing::info!(note_count = notes.len(), "committed generated segment");
    } else {
        tracing::debug!(note_count = notes.len(), "previewed generated segment");
    }

    Ok(SegmentResult { notes, chord_events, sub_seed: seed })
}

fn generate_drum_notes(clip: &Clip, seed: u64, variation: f64) -> Result<Vec<Note>> {
    let ClipParams::Drums { style, density, swing, pause_probability, fill_probability, roll_probability } = &clip.params else {
        return Ok(Vec::new());
    };
    let style = match style.as_str() {
        "trap" => DrumStyle::Trap,
        "drill" => DrumStyle::Drill,
        "lofi" => DrumStyle::Lofi,
        "minimal" => DrumStyle::Minimal,
        _ => DrumStyle::BoomBap,
    };
    let params = DrumParams {
        style,
        bars: clip.length_bars,
        base_seed: seed as i64,
        density: (*density * (1.0 - variation * 0.3)).clamp(0.0, 1.0),
        swing: *swing,
        pause_probability: *pause_probability,
        pause_scope: PauseScope::Kick,
        fill_probability: *fill_probability,
        roll_probability: *roll_probability,
        hat_mode: HatMode::Straight8,
        kick_pitch: 36,
        snare_pitch: 38,
        hat_pitch: 42,
    };
    Ok(generate_drum_pattern(&params)
        .iter()
        .map(|g| to_model_note(clip.id, g))
        .collect())
}

fn generate_melody_notes(clip: &Clip, tonic_pc: u8, mode: reel_theory::Mode, seed: u64) -> Result<Vec<Note>> {
    let (stepwise_bias, leap_probability) = match &clip.params {
        ClipParams::Melody { stepwise_bias, leap_probability } => (*stepwise_bias, *leap_probability),
        _ => (0.6, 0.2),
    };
    let params = MelodyParams {
        tonic_pc,
        mode,
        bars: clip.length_bars,
        seed,
        stepwise_bias,
        leap_probability,
    };
    Ok(generate_melody(&params).iter().map(|g| to_model_note(clip.id, g)).collect())
}

fn generate_bass_notes(
    store: &dyn Store,
    clip: &Clip,
    tonic_pc: u8,
    mode: reel_theory::Mode,
    seed: u64,
    tpb: i64,
) -> Result<Vec<Note>> {
    let syncopation = match &clip.params {
        ClipParams::Bass { syncopation } => *syncopation,
        _ => 0.3,
    };
    let chord_events = store.list_chord_events_by_clip(clip.id);
    let progression: Vec<crate::progression::ChordSlot> = chord_events
        .iter()
        .map(|e| crate::progression::ChordSlot {
            roman_numeral: e.roman_numeral.clone(),
            chord_name: e.chord_name.clone(),
            start_bar: (e.start_tick / tpb.max(1)) as u32,
            length_bars: ((e.duration_tick + tpb - 1) / tpb.max(1)).max(1) as u32,
        })
        .collect();
    let params = BassParams { tonic_pc, mode, seed, syncopation, bass_octave: 2 };
    Ok(generate_bassline(&params, &progression, tpb)
        .iter()
        .map(|g| to_model_note(clip.id, g))
        .collect())
}

fn generate_chord_notes(
    clip: &Clip,
    tonic_pc: u8,
    mode: reel_theory::Mode,
    seed: u64,
    ticks_per_bar: i64,
) -> Result<(Vec<Note>, Vec<ChordEvent>)> {
    let (start_on, prefer_circle_motion, cadence_ending) = match &clip.params {
        ClipParams::Progression { start_on, prefer_circle_motion, cadence_ending } => {
            (start_on.clone(), *prefer_circle_motion, *cadence_ending)
        }
        _ => ("I".to_string(), true, true),
    };
    let params = ProgressionParams { tonic_pc, mode, bars: clip.length_bars, seed, start_on, prefer_circle_motion, cadence_ending };
    let slots = generate_progression(&params);

    let mut events = Vec::new();
    let mut prev_voicing: Option<Vec<i32>> = None;
    let mut notes = Vec::new();
    for slot in &slots {
        let start_tick = slot.start_bar as i64 * ticks_per_bar;
        let duration_tick = slot.length_bars as i64 * ticks_per_bar;
        let event = default_chord_event(clip.id, &slot.roman_numeral, &slot.chord_name, start_tick, duration_tick);
        let voiced = voice_chord(&event, tonic_pc, mode, 48, 72, prev_voicing.as_deref());
        notes.extend(render_chord_event_to_notes(&event, &voiced, seed).iter().map(|g| to_model_note(clip.id, g)));
        prev_voicing = Some(voiced);
        events.push(event);
    }
    Ok((notes, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_model::{GridMode, InMemoryStore, Mode as ModelMode, Project, Track, TrackRole};

    fn setup() -> (InMemoryStore, Uuid, Uuid) {
        let store = InMemoryStore::new();
        let project = store
            .insert_project(Project {
                id: Uuid::new_v4(),
                name: "demo".into(),
                bpm: 120,
                time_signature_num: 4,
                time_signature_den: 4,
                bars: 4,
                key_tonic: "C".into(),
                mode: ModelMode::Ionian,
                seed: 1,
            })
            .unwrap();
        let track = store
            .insert_track(Track {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: "drums".into(),
                role: TrackRole::Drums,
                midi_channel: 9,
                midi_program: 0,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
            })
            .unwrap();
        let clip = store
            .insert_clip(Clip {
                id: Uuid::new_v4(),
                track_id: track.id,
                start_bar: 0,
                length_bars: 2,
                grid_mode: GridMode::Standard,
                polyrhythm_profile_id: None,
                drum_map_profile_id: None,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
                intensity: 1.0,
                params: ClipParams::Drums {
                    style: "boom_bap".into(),
                    density: 1.0,
                    swing: 0.0,
                    pause_probability: 0.0,
                    fill_probability: 0.0,
                    roll_probability: 0.0,
                },
            })
            .unwrap();
        (store, project.id, clip.id)
    }

    #[test]
    fn preview_does_not_persist() {
        let (store, project_id, clip_id) = setup();
        let request = SegmentRequest {
            project_id,
            clip_id,
            kind: GenerationKind::Drums,
            base_seed: 1,
            variation: 0.0,
            preview: true,
        };
        let result = generate_segment(&store, &request).unwrap();
        assert!(!result.notes.is_empty());
        assert!(store.list_notes_by_clip(clip_id).is_empty());
    }

    #[test]
    fn commit_persists_notes() {
        let (store, project_id, clip_id) = setup();
        let request = SegmentRequest {
            project_id,
            clip_id,
            kind: GenerationKind::Drums,
            base_seed: 1,
            variation: 0.0,
            preview: false,
        };
        generate_segment(&store, &request).unwrap();
        assert!(!store.list_notes_by_clip(clip_id).is_empty());
    }
}
