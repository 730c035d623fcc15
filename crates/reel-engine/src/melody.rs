//! Scale-constrained melodic generation over a 16th-note grid.
//!
//! Grounded on `music/melody.py`.

use reel_rng::SeededRng;
use reel_theory::{scale_degrees, Mode};

use crate::drums::sixteenth_ticks;
use crate::GeneratedNote;

const STEPS_PER_BAR: usize = 16;
const DURATION_CHOICES_SIXTEENTHS: [i64; 3] = [2, 4, 8];

/// Four onset-step templates per bar, chosen per-bar by the seeded RNG.
const ONSET_PATTERNS: [&[usize]; 4] = [
    &[0, 2, 4, 6, 8, 10, 12, 14],
    &[0, 3, 6, 9, 12, 15],
    &[0, 4, 6, 8, 12, 14],
    &[2, 4, 7, 10, 12, 14],
];

pub struct MelodyParams {
    pub tonic_pc: u8,
    pub mode: Mode,
    pub bars: u32,
    pub seed: u64,
    pub stepwise_bias: f64,
    pub leap_probability: f64,
}

fn joined_scale(tonic_pc: u8, mode: Mode) -> Vec<i32> {
    let mut notes = Vec::with_capacity(21);
    for octave in [3, 4, 5] {
        notes.extend_from_slice(&scale_degrees(tonic_pc, mode, octave));
    }
    notes
}

pub fn generate_melody(params: &MelodyParams) -> Vec<GeneratedNote> {
    let scale = joined_scale(params.tonic_pc, params.mode);
    let step_ticks = sixteenth_ticks();
    let mut rng = SeededRng::from_seed_u64(params.seed ^ reel_rng::stable_hash_parts(&["melody"]));

    let mut index: i32 = (scale.len() / 2) as i32;
    let mut notes = Vec::new();

    for bar in 0..params.bars {
        let bar_start = bar as i64 * STEPS_PER_BAR as i64 * step_ticks;
        let pattern = rng.choose(&ONSET_PATTERNS).copied().unwrap_or(ONSET_PATTERNS[0]);

        for &step in pattern {
            if rng.gen_bool(params.stepwise_bias) {
                index += if rng.gen_bool(0.5) { 1 } else { -1 };
            } else if rng.gen_bool(params.leap_probability) {
                let leap = *rng.choose(&[2, 3, 4]).unwrap_or(&2);
                index += if rng.gen_bool(0.5) { leap } else { -leap };
            }
            index = index.clamp(0, scale.len() as i32 - 1);

            let duration_sixteenths = *rng.choose(&DURATION_CHOICES_SIXTEENTHS).unwrap_or(&4);
            let duration_tick = duration_sixteenths * step_ticks;
            let velocity = rng.gen_range_i32(80, 119) as u8;

            notes.push(GeneratedNote {
                start_tick: bar_start + step as i64 * step_ticks,
                duration_tick,
                pitch: scale[index as usize].clamp(0, 127) as u8,
                velocity,
                order_index: 0,
            });
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> MelodyParams {
        MelodyParams {
            tonic_pc: 0,
            mode: Mode::Ionian,
            bars: 4,
            seed,
            stepwise_bias: 0.6,
            leap_probability: 0.2,
        }
    }

    #[test]
    fn deterministic_for_same_seed() {
        let a = generate_melody(&params(3));
        let b = generate_melody(&params(3));
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.pitch, y.pitch);
            assert_eq!(x.start_tick, y.start_tick);
        }
    }

    #[test]
    fn pitches_and_velocities_are_in_midi_bounds() {
        for note in generate_melody(&params(11)) {
            assert!(note.pitch <= 127);
            assert!((80..=119).contains(&note.velocity));
        }
    }
}
