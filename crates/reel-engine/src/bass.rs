//! Chord-aware bassline generation: root on beat 1, root/approach-note on
//! beat 3, with syncopation and an occasional 16th-note fill.
//!
//! Grounded on `music/bass.py`.

use reel_rng::SeededRng;
use reel_theory::{roman_to_degree, scale_degrees, Mode};

use crate::progression::ChordSlot;
use crate::timebase::PPQ;
use crate::GeneratedNote;

pub struct BassParams {
    pub tonic_pc: u8,
    pub mode: Mode,
    pub seed: u64,
    pub syncopation: f64,
    pub bass_octave: i32,
}

impl Default for BassParams {
    fn default() -> Self {
        Self {
            tonic_pc: 0,
            mode: Mode::Ionian,
            seed: 0,
            syncopation: 0.3,
            bass_octave: 2,
        }
    }
}

fn root_pitch(tonic_pc: u8, mode: Mode, octave: i32, roman: &str) -> u8 {
    let degree = roman_to_degree(roman);
    let scale = scale_degrees(tonic_pc, mode, octave);
    scale[(degree.saturating_sub(1) % 7) as usize].clamp(0, 127) as u8
}

pub fn generate_bassline(params: &BassParams, progression: &[ChordSlot], ticks_per_bar: i64) -> Vec<GeneratedNote> {
    let mut rng = SeededRng::from_seed_u64(params.seed ^ reel_rng::stable_hash_parts(&["bass"]));
    let half_bar = ticks_per_bar / 2;
    let mut notes = Vec::new();

    for slot in progression {
        let root = root_pitch(params.tonic_pc, params.mode, params.bass_octave, &slot.roman_numeral);
        for bar_offset in 0..slot.length_bars {
            let bar_abs = slot.start_bar + bar_offset;
            let bar_start = bar_abs as i64 * ticks_per_bar;

            notes.push(GeneratedNote {
                start_tick: bar_start,
                duration_tick: half_bar,
                pitch: root,
                velocity: 105,
                order_index: 0,
            });

            if rng.gen_bool(0.8) {
                let mut beat3_tick = bar_start + 2 * PPQ;
                if rng.gen_bool(params.syncopation) {
                    beat3_tick -= PPQ / 8;
                }
                let pitch = if rng.gen_bool(0.3) {
                    root.saturating_sub(2)
                } else {
                    root
                };
                notes.push(GeneratedNote {
                    start_tick: beat3_tick.max(bar_start),
                    duration_tick: half_bar,
                    pitch,
                    velocity: 100,
                    order_index: 0,
                });
            }

            if rng.gen_bool(0.2) {
                notes.push(GeneratedNote {
                    start_tick: bar_start + 3 * PPQ,
                    duration_tick: PPQ / 4,
                    pitch: root,
                    velocity: 95,
                    order_index: 0,
                });
            }
        }
    }

    notes.sort_by(|a, b| a.start_tick.cmp(&b.start_tick).then(a.pitch.cmp(&b.pitch)));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ChordSlot;

    #[test]
    fn deterministic_and_in_bounds() {
        let progression = vec![
            ChordSlot { roman_numeral: "I".into(), chord_name: "C".into(), start_bar: 0, length_bars: 1 },
            ChordSlot { roman_numeral: "IV".into(), chord_name: "F".into(), start_bar: 1, length_bars: 1 },
        ];
        let params = BassParams { seed: 5, ..Default::default() };
        let a = generate_bassline(&params, &progression, 1920);
        let b = generate_bassline(&params, &progression, 1920);
        assert_eq!(a.len(), b.len());
        for note in &a {
            assert!(note.pitch <= 127);
            assert!((1..=127).contains(&note.velocity));
            assert!(note.start_tick >= 0);
        }
    }
}
