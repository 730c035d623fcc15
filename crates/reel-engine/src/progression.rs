//! Diatonic chord progression generation and scored candidate generation.
//!
//! Grounded on `music/progression.py` (bar-by-bar generation, circle-of-fifths
//! motion, cadence termination) and `music/chords_generate.py` (candidate
//! seeding and scoring).

use std::collections::BTreeMap;

use reel_rng::SeededRng;
use reel_theory::{chord_notes, roman_to_chord_name, roman_to_degree, triad_quality, ChordQuality, Mode, TriadQuality};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordSlot {
    pub roman_numeral: String,
    pub chord_name: String,
    pub start_bar: u32,
    pub length_bars: u32,
}

fn is_major_like(mode: Mode) -> bool {
    matches!(mode, Mode::Ionian | Mode::Lydian | Mode::Mixolydian)
}

fn degree_to_roman(tonic_pc: u8, mode: Mode, degree: u8) -> String {
    let triad = chord_notes(tonic_pc, mode, degree, ChordQuality::Triad, 4);
    let quality = triad_quality(&triad);
    const BASE: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];
    let base = BASE[((degree - 1) % 7) as usize];
    match quality {
        TriadQuality::Major => base.to_string(),
        TriadQuality::Minor => base.to_lowercase(),
        TriadQuality::Diminished => format!("{}\u{00b0}", base.to_lowercase()),
        TriadQuality::Augmented => format!("{base}+"),
    }
}

fn cadence_pool(major_like: bool) -> Vec<Vec<&'static str>> {
    if major_like {
        vec![vec!["V", "I"], vec!["ii", "V", "I"]]
    } else {
        vec![vec!["V", "i"], vec!["iv", "V", "i"]]
    }
}

fn common_progression_table(major_like: bool) -> Vec<&'static str> {
    if major_like {
        vec!["I", "IV", "V", "I", "vi", "IV", "V", "I"]
    } else {
        vec!["i", "VI", "VII", "i", "iv", "v", "VI", "i"]
    }
}

pub struct ProgressionParams {
    pub tonic_pc: u8,
    pub mode: Mode,
    pub bars: u32,
    pub seed: u64,
    pub start_on: String,
    pub prefer_circle_motion: bool,
    pub cadence_ending: bool,
}

/// Generate chord slots covering `[0, bars)`.
pub fn generate_progression(params: &ProgressionParams) -> Vec<ChordSlot> {
    generate_progression_with_locks(params, &BTreeMap::new())
}

pub fn generate_progression_with_locks(params: &ProgressionParams, locks: &BTreeMap<u32, String>) -> Vec<ChordSlot> {
    let major_like = is_major_like(params.mode);
    let mut rng = SeededRng::from_seed_u64(params.seed ^ reel_rng::stable_hash_parts(&["progression"]));
    let mut slots = Vec::new();
    let mut bar = 0u32;
    let mut prev_degree = roman_to_degree(&params.start_on);
    let mut first = true;
    let table = common_progression_table(major_like);

    while bar < params.bars {
        let remaining = params.bars - bar;

        if params.cadence_ending && remaining < 2 {
            let pool = cadence_pool(major_like);
            let seq = rng.choose(&pool).cloned().unwrap_or_default();
            let roman = locks
                .get(&bar)
                .cloned()
                .or_else(|| seq.last().map(|s| s.to_string()))
                .unwrap_or_else(|| if major_like { "I".to_string() } else { "i".to_string() });
            let chord_name = roman_to_chord_name(params.tonic_pc, params.mode, &roman);
            slots.push(ChordSlot {
                roman_numeral: roman,
                chord_name,
                start_bar: bar,
                length_bars: remaining,
            });
            break;
        }

        let roman = if let Some(locked) = locks.get(&bar) {
            locked.clone()
        } else if params.prefer_circle_motion && rng.gen_bool(0.7) {
            let dominant = !first && rng.gen_bool(0.5);
            let degree = if dominant {
                ((prev_degree as i32 - 1 + 3).rem_euclid(7) + 1) as u8
            } else {
                ((prev_degree as i32 - 1 - 3).rem_euclid(7) + 1) as u8
            };
            degree_to_roman(params.tonic_pc, params.mode, degree)
        } else {
            table[(bar as usize) % table.len()].to_string()
        };
        first = false;
        prev_degree = roman_to_degree(&roman);

        let length = if rng.gen_bool(0.3) { 2 } else { 1 }.min(remaining);
        let chord_name = roman_to_chord_name(params.tonic_pc, params.mode, &roman);
        slots.push(ChordSlot {
            roman_numeral: roman,
            chord_name,
            start_bar: bar,
            length_bars: length,
        });
        bar += length;
    }

    slots
}

#[derive(Debug, Clone)]
pub struct ProgressionCandidate {
    pub candidate_index: u32,
    pub seed_used: u64,
    pub roman_numerals: Vec<String>,
    pub score: f64,
}

/// Score a candidate's roman-numeral sequence per the linear combination in
/// the specification: lock satisfaction, repetition penalty, cadence bonus,
/// rhythm alignment, and a unique-chord complexity bonus.
pub fn score_progression(romans: &[String], locks: &BTreeMap<u32, String>, bars: u32, target_chords_per_bar: f64) -> f64 {
    let mut score = 0.0;

    for (bar, locked_roman) in locks {
        if romans.get(*bar as usize).map(|r| r.as_str()) != Some(locked_roman.as_str()) {
            score -= 10.0;
        }
    }

    for pair in romans.windows(2) {
        if pair[0] == pair[1] {
            score -= 0.1;
        }
    }

    if romans.len() >= 2 {
        let last_two = &romans[romans.len() - 2..];
        if matches!(last_two[1].as_str(), "I" | "i") && matches!(last_two[0].to_ascii_uppercase().as_str(), "V") {
            score += 0.5;
        }
    }
    if romans.len() >= 3 {
        let last_three = &romans[romans.len() - 3..];
        if matches!(last_three[2].as_str(), "I" | "i")
            && last_three[1].to_ascii_uppercase() == "V"
            && matches!(last_three[0].to_ascii_lowercase().as_str(), "ii" | "iv")
        {
            score += 0.7;
        }
    }

    let chords_per_bar = if bars > 0 { romans.len() as f64 / bars as f64 } else { 0.0 };
    score += 1.0 - 0.2 * (chords_per_bar - target_chords_per_bar).abs();

    let unique: std::collections::HashSet<&str> = romans.iter().map(|s| s.as_str()).collect();
    score += 0.1 * unique.len() as f64;

    score
}

/// Generate `count` independently-seeded candidates for `run_id`, each
/// scored and left unsorted (callers rank by `score` descending).
pub fn generate_progression_candidates(
    base: &ProgressionParams,
    run_id: &str,
    base_seed: i64,
    count: u32,
    locks: &BTreeMap<u32, String>,
    target_chords_per_bar: f64,
) -> Vec<ProgressionCandidate> {
    (0..count)
        .map(|candidate_index| {
            let seed = reel_rng::stable_hash_parts(&[run_id, &candidate_index.to_string(), &base_seed.to_string()]);
            let params = ProgressionParams {
                tonic_pc: base.tonic_pc,
                mode: base.mode,
                bars: base.bars,
                seed,
                start_on: base.start_on.clone(),
                prefer_circle_motion: base.prefer_circle_motion,
                cadence_ending: base.cadence_ending,
            };
            let slots = generate_progression_with_locks(&params, locks);
            let romans: Vec<String> = slots.iter().map(|s| s.roman_numeral.clone()).collect();
            let score = score_progression(&romans, locks, base.bars, target_chords_per_bar);
            ProgressionCandidate {
                candidate_index,
                seed_used: seed,
                roman_numerals: romans,
                score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64) -> ProgressionParams {
        ProgressionParams {
            tonic_pc: 0,
            mode: Mode::Ionian,
            bars: 8,
            seed,
            start_on: "I".to_string(),
            prefer_circle_motion: true,
            cadence_ending: true,
        }
    }

    #[test]
    fn covers_all_bars_contiguously() {
        let slots = generate_progression(&params(7));
        let mut bar = 0;
        for slot in &slots {
            assert_eq!(slot.start_bar, bar);
            bar += slot.length_bars;
        }
        assert_eq!(bar, 8);
    }

    #[test]
    fn deterministic_for_same_seed() {
        let a = generate_progression(&params(99));
        let b = generate_progression(&params(99));
        assert_eq!(a, b);
    }

    #[test]
    fn candidates_can_be_ranked_by_score() {
        let candidates = generate_progression_candidates(&params(1), "run-1", 1, 5, &BTreeMap::new(), 1.0);
        assert_eq!(candidates.len(), 5);
        let mut sorted = candidates.clone();
        sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        for w in sorted.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn locked_bar_violation_is_penalized() {
        let mut locks = BTreeMap::new();
        locks.insert(0u32, "vi".to_string());
        let unlocked_score = score_progression(&["I".into(), "IV".into()], &BTreeMap::new(), 2, 1.0);
        let locked_score = score_progression(&["I".into(), "IV".into()], &locks, 2, 1.0);
        assert!(locked_score < unlocked_score);
    }
}
