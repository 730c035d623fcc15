//! The generation and rendering core: timebase arithmetic, pattern
//! generators (Euclidean, drums, progression, melody, bass), the
//! multi-lane polyrhythm renderer, the chord renderer, the segment
//! orchestrator, and playback filtering.

pub mod bass;
pub mod chord_render;
pub mod drums;
pub mod euclidean;
pub mod melody;
pub mod orchestrator;
pub mod playback_filter;
pub mod polyrhythm;
pub mod progression;
pub mod timebase;

/// A note produced by a generator or renderer before it is wrapped into a
/// `reel_model::Note` by the orchestrator. Ticks are relative to the
/// owning clip unless documented otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedNote {
    pub start_tick: i64,
    pub duration_tick: i64,
    pub pitch: u8,
    pub velocity: u8,
    pub order_index: u32,
}

pub use orchestrator::{EngineError, Result};
