//! The single authoritative chord-event-to-notes renderer: voicing,
//! inversion, pattern realization (block/strum/comp/arp), velocity curves,
//! strum ordering/curves, gating, and humanization.
//!
//! Grounded on `services/chord_render.py::apply_voicing` (voicing/inversion)
//! and `music/chord_patterns.py::render_chord_event_to_notes` (pattern
//! realization, velocity curves, seeding). The `root`/`smooth` voicing cost
//! unification and the degenerate-range fallback follow the resolutions
//! recorded in `SPEC_FULL.md` section 9.

use reel_model::{ChordEvent, HitParams, PatternType, StrumCurve, StrumDirection, Voicing};
use reel_rng::SeededRng;
use reel_theory::{chord_notes, ChordQuality, Mode, RomanNumeral};

use crate::timebase::PPQ;
use crate::GeneratedNote;

fn chord_seed(base_seed: u64, event_id: &str, stream: &str) -> u64 {
    base_seed ^ reel_rng::stable_hash_parts(&[event_id, stream])
}

/// Pitch classes (0-11, sorted, deduped) for a chord event's roman numeral.
fn pitch_classes(tonic_pc: u8, mode: Mode, roman: &RomanNumeral) -> Vec<u8> {
    let quality = if roman.is_seventh() { ChordQuality::Seventh } else { ChordQuality::Triad };
    let tones = chord_notes(tonic_pc, mode, roman.degree, quality, 4);
    let mut pcs: Vec<u8> = tones
        .iter()
        .map(|&t| (t + roman.accidental as i32).rem_euclid(12) as u8)
        .collect();
    pcs.sort_unstable();
    pcs.dedup();
    pcs
}

/// Per-voice cost vs. a previous voicing, or vs. the range midpoint when
/// there is none. Shared by the `root` and `smooth` voicing presets.
fn voicing_cost(candidate: &[i32], low: u8, high: u8, prev: Option<&[i32]>) -> f64 {
    match prev {
        Some(prev) => candidate
            .iter()
            .zip(prev.iter())
            .map(|(a, b)| (a - b).unsigned_abs() as f64)
            .sum(),
        None => {
            let mean = candidate.iter().sum::<i32>() as f64 / candidate.len().max(1) as f64;
            let midpoint = (low as f64 + high as f64) / 2.0;
            (mean - midpoint).abs()
        }
    }
}

/// Degenerate-range fallback: force a single mid-range octave rather than
/// returning an empty voicing.
fn degenerate_octave(low: u8, high: u8) -> i32 {
    (low as i32 + high as i32) / 24
}

fn candidates_in_range(pcs: &[u8], low: u8, high: u8) -> Vec<Vec<i32>> {
    let mut out = Vec::new();
    for octave in -1..=9 {
        let candidate: Vec<i32> = pcs.iter().map(|&pc| pc as i32 + 12 * octave).collect();
        if candidate.iter().all(|&n| n >= low as i32 && n <= high as i32) {
            out.push(candidate);
        }
    }
    out
}

/// Shared search used by both `root` and `smooth`: the minimum-cost octave
/// placement of `pcs` within `[low, high]`, falling back to a forced
/// mid-range octave when no placement fits.
fn voice_root_or_smooth(pcs: &[u8], low: u8, high: u8, prev: Option<&[i32]>) -> Vec<i32> {
    let candidates = candidates_in_range(pcs, low, high);
    if candidates.is_empty() {
        let octave = degenerate_octave(low, high);
        return pcs.iter().map(|&pc| pc as i32 + 12 * octave).collect();
    }
    candidates
        .into_iter()
        .min_by(|a, b| voicing_cost(a, low, high, prev).partial_cmp(&voicing_cost(b, low, high, prev)).unwrap())
        .unwrap()
}

fn voice_open(pcs: &[u8], low: u8, high: u8) -> Vec<i32> {
    if pcs.is_empty() {
        return Vec::new();
    }
    let mut octave = (low as i32) / 12;
    let mut root = pcs[0] as i32 + 12 * octave;
    while root < low as i32 {
        octave += 1;
        root = pcs[0] as i32 + 12 * octave;
    }
    if root > high as i32 {
        octave = degenerate_octave(low, high);
        root = pcs[0] as i32 + 12 * octave;
    }
    let mut out = vec![root];
    for &pc in &pcs[1..] {
        let mut note = pc as i32 + 12 * (octave + 1);
        if note > 127 {
            note -= 12;
        }
        out.push(note);
    }
    out
}

fn voice_drop2(mut voiced: Vec<i32>) -> Vec<i32> {
    voiced.sort_unstable();
    if voiced.len() >= 2 {
        let idx = voiced.len() - 2;
        voiced[idx] -= 12;
    }
    voiced.sort_unstable();
    voiced
}

fn apply_inversion(mut voiced: Vec<i32>, inversion: u8) -> Vec<i32> {
    for _ in 0..inversion {
        voiced.sort_unstable();
        if voiced.is_empty() {
            break;
        }
        let lowest = voiced.remove(0);
        voiced.push(lowest + 12);
    }
    voiced.sort_unstable();
    voiced
}

/// Select and invert the chord's voicing, threading the previous chord
/// event's voicing through for voice-leading-sensitive presets.
pub fn voice_chord(event: &ChordEvent, tonic_pc: u8, mode: Mode, low: u8, high: u8, prev: Option<&[i32]>) -> Vec<i32> {
    let roman = RomanNumeral::parse(&event.roman_numeral);
    let pcs = pitch_classes(tonic_pc, mode, &roman);
    let voiced = match event.voicing {
        Voicing::Root => voice_root_or_smooth(&pcs, low, high, prev),
        Voicing::Smooth => voice_root_or_smooth(&pcs, low, high, prev),
        Voicing::Open => voice_open(&pcs, low, high),
        Voicing::Drop2 => {
            let base = voice_root_or_smooth(&pcs, low, high, prev);
            voice_drop2(base)
        }
    };
    apply_inversion(voiced, event.inversion)
}

struct RawNote {
    start_offset: i64,
    pitch: i32,
    accent: f64,
}

fn curve_position(progress: f64, curve: StrumCurve) -> f64 {
    match curve {
        StrumCurve::Linear => progress,
        StrumCurve::Exponential => progress * progress,
        StrumCurve::Logarithmic => (1.0 + 9.0 * progress).ln() / 10f64.ln(),
    }
}

fn strum_order(voiced: &[i32], direction: StrumDirection, rng: &mut SeededRng) -> Vec<i32> {
    let mut ascending = voiced.to_vec();
    ascending.sort_unstable();
    match direction {
        StrumDirection::Down => ascending,
        StrumDirection::Up => {
            let mut v = ascending;
            v.reverse();
            v
        }
        StrumDirection::Alternate => {
            let mut out = Vec::with_capacity(ascending.len());
            let mut lo = 0usize;
            let mut hi = ascending.len().saturating_sub(1);
            let mut take_low = true;
            while lo <= hi {
                if take_low {
                    out.push(ascending[lo]);
                    if lo == hi {
                        break;
                    }
                    lo += 1;
                } else {
                    out.push(ascending[hi]);
                    if hi == 0 {
                        break;
                    }
                    hi -= 1;
                }
                take_low = !take_low;
            }
            out
        }
        StrumDirection::Random => {
            let mut v = ascending;
            rng.shuffle(&mut v);
            v
        }
    }
}

fn render_raw_notes(event: &ChordEvent, voiced: &[i32], strum_rng: &mut SeededRng) -> Vec<RawNote> {
    match event.pattern_type {
        PatternType::Block => voiced
            .iter()
            .map(|&pitch| RawNote { start_offset: 0, pitch, accent: 1.0 })
            .collect(),
        PatternType::Strum => {
            let ordered = strum_order(voiced, event.strum_direction, strum_rng);
            let strum_ticks = (event.strum_beats * PPQ as f64).floor() * event.strum_spread;
            let n = ordered.len().max(1);
            ordered
                .iter()
                .enumerate()
                .map(|(i, &pitch)| {
                    let progress = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
                    let offset = (curve_position(progress, event.strum_curve) * strum_ticks).round() as i64;
                    RawNote { start_offset: offset, pitch, accent: 1.0 }
                })
                .collect()
        }
        PatternType::Comp => {
            let Some(comp) = &event.comp_pattern else {
                return voiced.iter().map(|&pitch| RawNote { start_offset: 0, pitch, accent: 1.0 }).collect();
            };
            let ticks_per_step = PPQ * 4 / comp.grid.max(1) as i64;
            let mut raw = Vec::new();
            for (step, &active) in comp.steps.iter().enumerate() {
                if !active {
                    continue;
                }
                let swing_offset = if step % 2 == 1 { ticks_per_step / 4 } else { 0 };
                let offset = step as i64 * ticks_per_step + swing_offset;
                let accent = comp.accent_for(step);
                for &pitch in voiced {
                    raw.push(RawNote { start_offset: offset, pitch, accent });
                }
            }
            if !event.retrigger {
                let mut seen = std::collections::HashSet::new();
                raw.retain(|n| seen.insert(n.pitch));
            }
            raw
        }
        PatternType::Arp => {
            let subdivision = event.hit_params.as_ref().and_then(|h| match h {
                HitParams::ArpSubdivision { subdivision } => Some(*subdivision),
                _ => None,
            });
            let Some(subdivision) = subdivision else {
                return voiced.iter().map(|&pitch| RawNote { start_offset: 0, pitch, accent: 1.0 }).collect();
            };
            let ticks_per_step = PPQ * 4 / subdivision.max(1) as i64;
            let mut ascending = voiced.to_vec();
            ascending.sort_unstable();
            ascending
                .iter()
                .enumerate()
                .map(|(i, &pitch)| RawNote { start_offset: i as i64 * ticks_per_step, pitch, accent: 1.0 })
                .collect()
        }
    }
}

fn velocity_curve_multiplier(curve: reel_model::VelocityCurve, index: usize, n: usize) -> f64 {
    use reel_model::VelocityCurve::*;
    if n <= 1 {
        return 1.0;
    }
    let i = index as f64;
    let denom = (n - 1) as f64;
    match curve {
        Flat => 1.0,
        Down => 1.0 - 0.3 * i / denom,
        Up => 0.7 + 0.3 * i / denom,
        Swell => {
            let c = denom / 2.0;
            1.0 - 0.2 * (i - c).abs() / c.max(f64::EPSILON)
        }
        Dip => {
            let c = denom / 2.0;
            0.8 + 0.2 * (i - c).abs() / c.max(f64::EPSILON)
        }
    }
}

/// Render one chord event into notes, given its already-selected voicing.
pub fn render_chord_event_to_notes(event: &ChordEvent, voiced: &[i32], base_seed: u64) -> Vec<GeneratedNote> {
    let strum_seed = chord_seed(base_seed, &event.id.to_string(), "strum");
    let humanize_seed = chord_seed(base_seed, &event.id.to_string(), "humanize");
    let velocity_seed = chord_seed(base_seed, &event.id.to_string(), "velocity");
    let pattern_seed = chord_seed(base_seed, &event.id.to_string(), "pattern");

    let mut strum_rng = SeededRng::from_seed_u64(strum_seed);
    let raw = render_raw_notes(event, voiced, &mut strum_rng);
    let n = raw.len();

    let mut humanize_rng = SeededRng::from_seed_u64(humanize_seed);
    let mut velocity_rng = SeededRng::from_seed_u64(velocity_seed);
    // pattern_seed is reserved for future pattern-selection randomness, unused for now.
    let _pattern_rng = SeededRng::from_seed_u64(pattern_seed);

    let humanize_ticks = (event.humanize_beats * PPQ as f64).floor() as i32;
    let gated_duration = (event.duration_tick as f64 * event.duration_gate).floor().max(1.0) as i64;

    let mut notes = Vec::with_capacity(n);
    for (index, raw_note) in raw.into_iter().enumerate() {
        let mut start = event.start_tick + raw_note.start_offset;
        let jitter = humanize_rng.jitter_ticks(humanize_ticks) as i64;
        start = (start + jitter).clamp(event.start_tick, event.start_tick + event.duration_tick);

        let base = (100.0 * event.intensity * raw_note.accent).round();
        let curved = base * velocity_curve_multiplier(event.velocity_curve, index, n);
        let jitter_v = if event.velocity_jitter > 0 {
            velocity_rng.gen_range_i32(-event.velocity_jitter, event.velocity_jitter)
        } else {
            0
        };
        let velocity = (curved + jitter_v as f64).clamp(1.0, 127.0) as u8;

        notes.push(GeneratedNote {
            start_tick: start,
            duration_tick: gated_duration,
            pitch: raw_note.pitch.clamp(0, 127) as u8,
            velocity,
            order_index: 0,
        });
    }

    notes.sort_by(|a, b| a.start_tick.cmp(&b.start_tick).then(a.pitch.cmp(&b.pitch)));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_model::{PatternType, StrumCurve, StrumDirection, VelocityCurve};
    use uuid::Uuid;

    fn base_event(start_tick: i64, duration_tick: i64) -> ChordEvent {
        ChordEvent {
            id: Uuid::new_v4(),
            clip_id: Uuid::new_v4(),
            start_tick,
            duration_tick,
            duration_beats: duration_tick as f64 / PPQ as f64,
            roman_numeral: "I".into(),
            chord_name: "C".into(),
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
            comp_pattern: None,
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

    #[test]
    fn s6_block_pattern_root_voicing() {
        let event = base_event(0, 1920);
        let voiced = voice_chord(&event, 0, Mode::Ionian, 48, 72, None);
        let notes = render_chord_event_to_notes(&event, &voiced, 1);
        assert_eq!(notes.len(), 3);
        for n in &notes {
            assert_eq!(n.start_tick, 0);
            assert_eq!(n.duration_tick, 1632);
            assert_eq!(n.velocity, 100);
        }
        let mut pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
        pitches.sort_unstable();
        assert_eq!(pitches, vec![60, 64, 67]);
    }

    #[test]
    fn degenerate_range_never_produces_empty_voicing() {
        let event = base_event(0, 480);
        let voiced = voice_chord(&event, 0, Mode::Ionian, 80, 40, None);
        assert!(!voiced.is_empty());
    }

    #[test]
    fn inversion_rotates_lowest_voice_up() {
        let mut event = base_event(0, 480);
        event.inversion = 1;
        let voiced = voice_chord(&event, 0, Mode::Ionian, 48, 72, None);
        let mut sorted = voiced.clone();
        sorted.sort_unstable();
        assert_eq!(sorted.len(), 3);
    }

    #[test]
    fn notes_are_sorted_by_start_then_pitch() {
        let mut event = base_event(0, 1920);
        event.pattern_type = PatternType::Strum;
        event.strum_beats = 0.5;
        let voiced = voice_chord(&event, 0, Mode::Ionian, 48, 72, None);
        let notes = render_chord_event_to_notes(&event, &voiced, 7);
        for w in notes.windows(2) {
            assert!(w[0].start_tick <= w[1].start_tick);
        }
    }
}
