//! Style-driven drum pattern generation: kick/snare/hat/ghost/fill layers
//! over a 16-step-per-bar grid, with density, swing, pause, and fill
//! behavior layered on top.
//!
//! Grounded on `music/drums.py`.

use reel_rng::SeededRng;
use serde::{Deserialize, Serialize};

use crate::timebase::PPQ;
use crate::GeneratedNote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumStyle {
    BoomBap,
    Trap,
    Drill,
    Lofi,
    Minimal,
}

impl DrumStyle {
    fn kick_steps(self) -> &'static [usize] {
        match self {
            DrumStyle::BoomBap => &[0, 6, 8, 14],
            DrumStyle::Trap => &[0, 8, 12],
            DrumStyle::Drill => &[0, 4, 8, 12],
            DrumStyle::Lofi => &[0, 8],
            DrumStyle::Minimal => &[0],
        }
    }
}

const SNARE_STEPS: [usize; 2] = [4, 12];
const STEPS_PER_BAR: usize = 16;

pub fn sixteenth_ticks() -> i64 {
    PPQ / 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HatMode {
    Straight8,
    Straight16,
    SkipStep,
    Roll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseScope {
    Kick,
    All,
}

#[derive(Debug, Clone)]
pub struct DrumParams {
    pub style: DrumStyle,
    pub bars: u32,
    pub base_seed: i64,
    pub density: f64,
    pub swing: f64,
    pub pause_probability: f64,
    pub pause_scope: PauseScope,
    pub fill_probability: f64,
    pub roll_probability: f64,
    pub hat_mode: HatMode,
    pub kick_pitch: u8,
    pub snare_pitch: u8,
    pub hat_pitch: u8,
}

fn stream_seed(base_seed: i64, bar_index: u32, role: &str, param: &str) -> u64 {
    reel_rng::stable_hash_parts(&[&base_seed.to_string(), &bar_index.to_string(), role, param])
}

fn velocity_for(rng: &mut SeededRng, low: i32, high: i32) -> u8 {
    rng.gen_range_i32(low, high) as u8
}

fn swing_offset(step: usize, step_ticks: i64, swing: f64) -> i64 {
    if step % 2 == 1 {
        (step_ticks as f64 * swing).floor() as i64
    } else {
        0
    }
}

fn syncopate(rng: &mut SeededRng, step: usize) -> i64 {
    if step % 4 != 0 {
        rng.gen_range_i32(-(PPQ as i32 / 8), PPQ as i32 / 8) as i64
    } else {
        0
    }
}

fn push_hit(out: &mut Vec<GeneratedNote>, bar_start: i64, step: usize, step_ticks: i64, swing: f64, jitter: i64, pitch: u8, velocity: u8, duration: i64) {
    let tick = bar_start + step as i64 * step_ticks + swing_offset(step, step_ticks, swing) + jitter;
    out.push(GeneratedNote {
        start_tick: tick.max(bar_start),
        duration_tick: duration,
        pitch,
        velocity,
        order_index: 0,
    });
}

pub fn generate_kick_pattern(params: &DrumParams, bar_index: u32, bar_start: i64) -> Vec<GeneratedNote> {
    let step_ticks = sixteenth_ticks();
    let mut density_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "kick", "density"));
    let mut variation_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "kick", "variation"));
    let mut velocity_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "kick", "velocity"));
    let mut sync_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "kick", "sync"));

    let mut out = Vec::new();
    for &base_step in params.style.kick_steps() {
        if density_rng.gen_range_f64(0.0, 1.0) > params.density {
            continue;
        }
        let mut step = base_step;
        if variation_rng.gen_bool(0.2) {
            let shift: i32 = if variation_rng.gen_bool(0.5) { 1 } else { -1 };
            step = (step as i32 + shift).clamp(0, STEPS_PER_BAR as i32 - 1) as usize;
        }
        let velocity = if step % 4 == 0 {
            velocity_for(&mut velocity_rng, 110, 127)
        } else {
            velocity_for(&mut velocity_rng, 90, 110)
        };
        let jitter = syncopate(&mut sync_rng, step);
        push_hit(&mut out, bar_start, step, step_ticks, params.swing, jitter, params.kick_pitch, velocity, step_ticks);
    }
    out
}

pub fn generate_snare_pattern(params: &DrumParams, bar_index: u32, bar_start: i64) -> Vec<GeneratedNote> {
    let step_ticks = sixteenth_ticks();
    let mut density_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "snare", "density"));
    let mut velocity_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "snare", "velocity"));
    let mut sync_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "snare", "sync"));

    let mut out = Vec::new();
    for &step in &SNARE_STEPS {
        if density_rng.gen_range_f64(0.0, 1.0) > params.density {
            continue;
        }
        let velocity = velocity_for(&mut velocity_rng, 100, 120);
        let jitter = syncopate(&mut sync_rng, step);
        push_hit(&mut out, bar_start, step, step_ticks, params.swing, jitter, params.snare_pitch, velocity, step_ticks);
    }
    out
}

pub fn generate_hat_pattern(params: &DrumParams, bar_index: u32, bar_start: i64) -> Vec<GeneratedNote> {
    let step_ticks = sixteenth_ticks();
    let mut density_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "hats", "density"));
    let mut velocity_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "hats", "velocity"));
    let mut roll_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "hats", "roll"));

    let base_steps: Vec<usize> = match params.hat_mode {
        HatMode::Straight8 => (0..STEPS_PER_BAR).step_by(2).collect(),
        HatMode::Straight16 => (0..STEPS_PER_BAR).collect(),
        HatMode::SkipStep => (0..STEPS_PER_BAR).step_by(2).collect(),
        HatMode::Roll => (0..STEPS_PER_BAR).step_by(4).collect(),
    };

    let mut out = Vec::new();
    for step in base_steps {
        if matches!(params.hat_mode, HatMode::SkipStep) && density_rng.gen_range_f64(0.0, 1.0) > params.density {
            continue;
        }
        let velocity = velocity_for(&mut velocity_rng, 70, 110);
        push_hit(&mut out, bar_start, step, step_ticks, params.swing, 0, params.hat_pitch, velocity, step_ticks / 2);
    }

    if matches!(params.hat_mode, HatMode::Roll) && roll_rng.gen_bool(params.roll_probability) {
        let burst_32nd = roll_rng.gen_bool(0.5);
        let (count, subdivision_ticks) = if burst_32nd {
            (4, step_ticks / 2)
        } else {
            (6, step_ticks / 3)
        };
        let burst_start = bar_start + 8 * step_ticks;
        for i in 0..count {
            let velocity = velocity_for(&mut velocity_rng, 70, 110);
            out.push(GeneratedNote {
                start_tick: burst_start + i as i64 * subdivision_ticks,
                duration_tick: subdivision_ticks.max(1),
                pitch: params.hat_pitch,
                velocity,
                order_index: 0,
            });
        }
    }
    out
}

pub fn generate_ghost_notes(params: &DrumParams, bar_index: u32, bar_start: i64, occupied_steps: &[usize]) -> Vec<GeneratedNote> {
    let step_ticks = sixteenth_ticks();
    let mut ghost_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "ghost", "density"));
    let mut velocity_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "ghost", "velocity"));

    let mut out = Vec::new();
    for step in 0..STEPS_PER_BAR {
        if occupied_steps.contains(&step) {
            continue;
        }
        if ghost_rng.gen_bool(0.15 * params.density) {
            let velocity = velocity_for(&mut velocity_rng, 40, 60);
            push_hit(&mut out, bar_start, step, step_ticks, params.swing, 0, params.snare_pitch, velocity, step_ticks);
        }
    }
    out
}

pub fn generate_fill_pattern(params: &DrumParams, bar_index: u32, bar_start: i64) -> Vec<GeneratedNote> {
    let mut fill_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "fill", "trigger"));
    let num_hits = fill_rng.gen_range_i32(4, 8) as i64;
    let fill_length_ticks = 8 * sixteenth_ticks();
    let step_ticks = fill_length_ticks / num_hits;
    let half_bar_start = bar_start + fill_length_ticks;

    let mut velocity_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "fill", "velocity"));
    (0..num_hits)
        .map(|i| {
            let pitch = if i % 2 == 0 { params.snare_pitch } else { params.kick_pitch };
            GeneratedNote {
                start_tick: half_bar_start + i * step_ticks,
                duration_tick: step_ticks.max(1),
                pitch,
                velocity: velocity_for(&mut velocity_rng, 90, 121),
                order_index: 0,
            }
        })
        .collect()
}

/// Orchestrates kick/snare/hat/ghost/fill generation across `params.bars`,
/// applying per-bar pauses and a final-bar fill, returning clip-relative notes.
pub fn generate_drum_pattern(params: &DrumParams) -> Vec<GeneratedNote> {
    let step_ticks = sixteenth_ticks();
    let mut notes = Vec::new();

    for bar_index in 0..params.bars {
        let bar_start = bar_index as i64 * STEPS_PER_BAR as i64 * step_ticks;
        let mut pause_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "pause", "trigger"));
        let paused = pause_rng.gen_bool(params.pause_probability);

        if paused && matches!(params.pause_scope, PauseScope::All) {
            continue;
        }

        let is_final_bar = bar_index + 1 == params.bars;
        let mut fill_rng = SeededRng::from_seed_u64(stream_seed(params.base_seed, bar_index, "fill", "gate"));
        let do_fill = is_final_bar && fill_rng.gen_bool(params.fill_probability);

        let mut kick = if paused && matches!(params.pause_scope, PauseScope::Kick) {
            Vec::new()
        } else {
            generate_kick_pattern(params, bar_index, bar_start)
        };
        let mut snare = generate_snare_pattern(params, bar_index, bar_start);
        let hats = generate_hat_pattern(params, bar_index, bar_start);

        let occupied: Vec<usize> = kick
            .iter()
            .chain(snare.iter())
            .map(|n| ((n.start_tick - bar_start) / step_ticks) as usize)
            .collect();
        let ghosts = generate_ghost_notes(params, bar_index, bar_start, &occupied);

        if do_fill {
            let fill_cut = bar_start + 8 * step_ticks;
            kick.retain(|n| n.start_tick < fill_cut);
            snare.retain(|n| n.start_tick < fill_cut);
            let fill_notes = generate_fill_pattern(params, bar_index, bar_start);
            notes.extend(kick);
            notes.extend(snare);
            notes.extend(hats.into_iter().filter(|n| n.start_tick < fill_cut));
            notes.extend(ghosts.into_iter().filter(|n| n.start_tick < fill_cut));
            notes.extend(fill_notes);
        } else {
            notes.extend(kick);
            notes.extend(snare);
            notes.extend(hats);
            notes.extend(ghosts);
        }
    }

    notes.sort_by(|a, b| a.start_tick.cmp(&b.start_tick).then(a.pitch.cmp(&b.pitch)));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params(style: DrumStyle) -> DrumParams {
        DrumParams {
            style,
            bars: 2,
            base_seed: 1,
            density: 1.0,
            swing: 0.0,
            pause_probability: 0.0,
            pause_scope: PauseScope::Kick,
            fill_probability: 0.0,
            roll_probability: 0.0,
            hat_mode: HatMode::Straight8,
            kick_pitch: 36,
            snare_pitch: 38,
            hat_pitch: 42,
        }
    }

    #[test]
    fn deterministic_across_runs() {
        let params = base_params(DrumStyle::BoomBap);
        let a = generate_drum_pattern(&params);
        let b = generate_drum_pattern(&params);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.start_tick, y.start_tick);
            assert_eq!(x.velocity, y.velocity);
            assert_eq!(x.pitch, y.pitch);
        }
    }

    #[test]
    fn velocity_and_pitch_stay_in_midi_bounds() {
        let params = base_params(DrumStyle::Trap);
        for note in generate_drum_pattern(&params) {
            assert!((1..=127).contains(&note.velocity));
            assert!(note.pitch <= 127);
        }
    }

    #[test]
    fn density_zero_with_no_ghosts_or_fills_yields_only_hats() {
        let mut params = base_params(DrumStyle::Minimal);
        params.density = 0.0;
        params.hat_mode = HatMode::SkipStep;
        let notes = generate_drum_pattern(&params);
        assert!(notes.iter().all(|n| n.pitch == params.hat_pitch || n.duration_tick > 0));
    }
}
