//! Domain entities for projects, tracks, clips, notes, chord events,
//! polyrhythm profiles/lanes, drum maps, and generation audit records,
//! plus a `Store` trait abstracting over however they are persisted.
//!
//! Grounded on the entity set in the original `midinecromancer` SQLAlchemy
//! models, re-expressed as plain value records per the parent-owns-children
//! tree convention rather than an ORM mapping.

pub mod params;
mod store;

pub use params::{ClipParams, CompPattern, HitParams};
pub use store::{InMemoryStore, Store};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("invariant violated on field `{field}`: {constraint}")]
    InvariantViolation { field: &'static str, constraint: String },
    #[error("chord event {id} is locked")]
    Locked { id: Uuid },
}

pub type Result<T> = std::result::Result<T, ModelError>;

fn check(cond: bool, field: &'static str, constraint: impl Into<String>) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(ModelError::InvariantViolation {
            field,
            constraint: constraint.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl From<Mode> for reel_theory::Mode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Ionian => reel_theory::Mode::Ionian,
            Mode::Dorian => reel_theory::Mode::Dorian,
            Mode::Phrygian => reel_theory::Mode::Phrygian,
            Mode::Lydian => reel_theory::Mode::Lydian,
            Mode::Mixolydian => reel_theory::Mode::Mixolydian,
            Mode::Aeolian => reel_theory::Mode::Aeolian,
            Mode::Locrian => reel_theory::Mode::Locrian,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub bpm: u16,
    pub time_signature_num: u8,
    pub time_signature_den: u8,
    pub bars: u16,
    pub key_tonic: String,
    pub mode: Mode,
    pub seed: i64,
}

impl Project {
    pub fn validate(&self) -> Result<()> {
        check((20..=300).contains(&self.bpm), "bpm", "must be in [20,300]")?;
        check(
            (1..=32).contains(&self.time_signature_num),
            "time_signature_num",
            "must be in [1,32]",
        )?;
        check(
            (1..=32).contains(&self.time_signature_den),
            "time_signature_den",
            "must be in [1,32]",
        )?;
        check((1..=256).contains(&self.bars), "bars", "must be in [1,256]")?;
        reel_theory::parse_tonic(&self.key_tonic)
            .map_err(|_| ModelError::InvariantViolation {
                field: "key_tonic",
                constraint: "must be a recognized pitch-class spelling".into(),
            })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Drums,
    Chords,
    Bass,
    Melody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub role: TrackRole,
    pub midi_channel: u8,
    pub midi_program: u8,
    pub is_muted: bool,
    pub is_soloed: bool,
    pub start_offset_ticks: i64,
}

impl Track {
    pub fn validate(&self) -> Result<()> {
        check(self.midi_channel <= 15, "midi_channel", "must be in [0,15]")?;
        check(self.midi_program <= 127, "midi_program", "must be in [0,127]")?;
        if self.role == TrackRole::Drums {
            check(self.midi_channel == 9, "midi_channel", "drum tracks must use channel 9")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    Standard,
    Euclidean,
    Polyrhythm,
    PolyrhythmMulti,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: Uuid,
    pub track_id: Uuid,
    pub start_bar: u32,
    pub length_bars: u32,
    pub grid_mode: GridMode,
    pub polyrhythm_profile_id: Option<Uuid>,
    pub drum_map_profile_id: Option<Uuid>,
    pub is_muted: bool,
    pub is_soloed: bool,
    pub start_offset_ticks: i64,
    pub intensity: f64,
    pub params: ClipParams,
}

impl Clip {
    pub fn validate(&self) -> Result<()> {
        check(self.length_bars >= 1, "length_bars", "must be >= 1")?;
        check((0.0..=2.0).contains(&self.intensity), "intensity", "must be in [0,2]")?;
        Ok(())
    }

    pub fn length_ticks(&self, ticks_per_bar: i64) -> i64 {
        self.length_bars as i64 * ticks_per_bar
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub clip_id: Uuid,
    pub pitch: u8,
    pub velocity: u8,
    pub start_tick: i64,
    pub duration_tick: i64,
    pub probability: f64,
}

impl Note {
    pub fn validate(&self) -> Result<()> {
        check(self.pitch <= 127, "pitch", "must be in [0,127]")?;
        check((1..=127).contains(&self.velocity), "velocity", "must be in [1,127]")?;
        check(self.start_tick >= 0, "start_tick", "must be >= 0")?;
        check(self.duration_tick >= 1, "duration_tick", "must be >= 1")?;
        check(
            (0.0..=1.0).contains(&self.probability),
            "probability",
            "must be in [0,1]",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voicing {
    Root,
    Open,
    Drop2,
    Smooth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Block,
    Strum,
    Comp,
    Arp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityCurve {
    Flat,
    Down,
    Up,
    Swell,
    Dip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrumDirection {
    Down,
    Up,
    Alternate,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrumCurve {
    Linear,
    Exponential,
    Logarithmic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordEvent {
    pub id: Uuid,
    pub clip_id: Uuid,
    pub start_tick: i64,
    pub duration_tick: i64,
    pub duration_beats: f64,
    pub roman_numeral: String,
    pub chord_name: String,
    pub intensity: f64,
    pub voicing: Voicing,
    pub inversion: u8,
    pub strum_beats: f64,
    pub humanize_beats: f64,
    pub offset_beats: f64,
    pub pattern_type: PatternType,
    pub duration_gate: f64,
    pub velocity_curve: VelocityCurve,
    pub strum_direction: StrumDirection,
    pub strum_spread: f64,
    pub strum_curve: StrumCurve,
    pub comp_pattern: Option<CompPattern>,
    pub hit_params: Option<HitParams>,
    pub retrigger: bool,
    pub velocity_jitter: i32,
    pub timing_jitter_ms: f64,
    pub is_enabled: bool,
    pub is_locked: bool,
    pub grid_quantum: Option<u32>,
    /// Legacy alias of `strum_beats`, expressed in milliseconds; accepted on
    /// input and re-derivable from `strum_beats` via the project's BPM.
    pub strum_ms: Option<f64>,
    /// Legacy alias of `humanize_beats`, expressed in milliseconds.
    pub humanize_ms: Option<f64>,
}

impl ChordEvent {
    pub fn validate(&self, clip_length_ticks: i64) -> Result<()> {
        check(self.strum_beats >= 0.0, "strum_beats", "must be >= 0")?;
        check(
            (0.0..=0.5).contains(&self.humanize_beats),
            "humanize_beats",
            "must be in [0,0.5]",
        )?;
        check(self.inversion <= 3, "inversion", "must be in [0,3]")?;
        check(
            (0.1..=1.0).contains(&self.duration_gate),
            "duration_gate",
            "must be in [0.1,1.0]",
        )?;
        check(
            self.start_tick + self.duration_tick <= clip_length_ticks,
            "duration_tick",
            "start_tick + duration_tick must not exceed clip length",
        )?;
        Ok(())
    }

    pub fn assert_mutable(&self, allow_unlock: bool) -> Result<()> {
        if self.is_locked && !allow_unlock {
            return Err(ModelError::Locked { id: self.id });
        }
        Ok(())
    }

    /// Milliseconds per beat at `bpm`, used to convert the legacy `*_ms`
    /// fields to/from their canonical `*_beats` counterparts.
    pub fn ms_per_beat(bpm: u16) -> f64 {
        60_000.0 / bpm as f64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolyrhythmProfile {
    pub id: Uuid,
    pub name: String,
    pub steps: u32,
    pub pulses: u32,
    pub rotation: u32,
    pub cycle_beats: f64,
    pub swing: Option<f64>,
    pub humanize_ms: Option<f64>,
}

impl PolyrhythmProfile {
    pub fn validate(&self) -> Result<()> {
        check((1..=128).contains(&self.steps), "steps", "must be in [1,128]")?;
        check((1..=128).contains(&self.pulses), "pulses", "must be in [1,128]")?;
        check(self.rotation < self.steps, "rotation", "must be in [0,steps)")?;
        check(
            (0.1..=32.0).contains(&self.cycle_beats),
            "cycle_beats",
            "must be in [0.1,32]",
        )?;
        if let Some(swing) = self.swing {
            check((0.0..=1.0).contains(&swing), "swing", "must be in [0,1]")?;
        }
        if let Some(hz) = self.humanize_ms {
            check((0.0..=100.0).contains(&hz), "humanize_ms", "must be in [0,100]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipPolyrhythmLane {
    pub id: Uuid,
    pub clip_id: Uuid,
    pub polyrhythm_profile_id: Uuid,
    pub lane_name: String,
    pub instrument_role: Option<String>,
    pub pitch: u8,
    pub velocity: u8,
    pub mute: bool,
    pub solo: bool,
    pub order_index: u32,
    pub seed_offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrumMapProfile {
    pub id: Uuid,
    pub name: String,
    pub kick: u8,
    pub snare: u8,
    pub clap: u8,
    pub closed_hat: u8,
    pub open_hat: u8,
    pub rim: u8,
    pub extra: std::collections::BTreeMap<String, u8>,
}

impl DrumMapProfile {
    /// General MIDI standard drum kit mapping on channel 9.
    pub fn general_midi(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kick: 36,
            snare: 38,
            clap: 39,
            closed_hat: 42,
            open_hat: 46,
            rim: 37,
            extra: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRun {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: String,
    pub seed_used: i64,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordProgressionCandidate {
    pub candidate_index: u32,
    pub seed_used: u64,
    pub roman_numerals: Vec<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordProgressionRun {
    pub id: Uuid,
    pub project_id: Uuid,
    pub base_seed: i64,
    pub requested_count: u32,
    pub candidates: Vec<ChordProgressionCandidate>,
    pub created_at: DateTime<Utc>,
}
