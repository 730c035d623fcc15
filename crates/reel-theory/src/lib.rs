//! Pitch classes, modal scales, diatonic chords, and roman-numeral resolution.
//!
//! Grounded on `examples/tobert-hootenanny/crates/music-understand/src/key.rs`
//! for note-name spelling conventions, generalized here to cover chord
//! construction and roman-numeral parsing for all seven church modes rather
//! than just major/minor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIDI note number for middle C (C4).
pub const MIDDLE_C: i32 = 60;

#[derive(Debug, thiserror::Error)]
pub enum TheoryError {
    #[error("unrecognized tonic spelling: {0}")]
    InvalidTonic(String),
    #[error("unrecognized mode: {0}")]
    InvalidMode(String),
}

/// The seven modal scales, in the order the major scale starts from each degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

impl Mode {
    /// Semitone offsets from the tonic for each of the seven scale degrees.
    pub const fn intervals(self) -> [i32; 7] {
        match self {
            Mode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            Mode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            Mode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            Mode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            Mode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            Mode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            Mode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Ionian => "ionian",
            Mode::Dorian => "dorian",
            Mode::Phrygian => "phrygian",
            Mode::Lydian => "lydian",
            Mode::Mixolydian => "mixolydian",
            Mode::Aeolian => "aeolian",
            Mode::Locrian => "locrian",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Mode {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ionian" => Ok(Mode::Ionian),
            "dorian" => Ok(Mode::Dorian),
            "phrygian" => Ok(Mode::Phrygian),
            "lydian" => Ok(Mode::Lydian),
            "mixolydian" => Ok(Mode::Mixolydian),
            "aeolian" => Ok(Mode::Aeolian),
            "locrian" => Ok(Mode::Locrian),
            _ => Err(TheoryError::InvalidMode(s.to_string())),
        }
    }
}

const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];
/// Pitch classes conventionally spelled with flats in key signatures.
const FLAT_PCS: [u8; 6] = [1, 3, 5, 6, 8, 10];

/// Render a pitch class (0-11) as a note name, preferring the flat spelling
/// when that pitch class is conventionally flatted.
pub fn pitch_class_name(pc: u8) -> &'static str {
    let pc = (pc % 12) as usize;
    if FLAT_PCS.contains(&(pc as u8)) {
        NOTE_NAMES_FLAT[pc]
    } else {
        NOTE_NAMES_SHARP[pc]
    }
}

/// Parse a tonic spelling such as "C", "F#", "Bb", "Cb" into a pitch class 0-11.
pub fn parse_tonic(tonic: &str) -> Result<u8, TheoryError> {
    let mut chars = tonic.chars();
    let letter = chars
        .next()
        .ok_or_else(|| TheoryError::InvalidTonic(tonic.to_string()))?
        .to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(TheoryError::InvalidTonic(tonic.to_string())),
    };
    let mut pc = base;
    for accidental in chars {
        match accidental {
            '#' => pc += 1,
            'b' | 'B' => pc -= 1,
            _ => return Err(TheoryError::InvalidTonic(tonic.to_string())),
        }
    }
    Ok(pc.rem_euclid(12) as u8)
}

/// MIDI pitches for the seven scale degrees of `tonic`/`mode` starting at `octave`
/// (octave 4 places the tonic's pitch class at or above MIDI 60).
pub fn scale_degrees(tonic_pc: u8, mode: Mode, octave: i32) -> [i32; 7] {
    let base_midi = 12 * octave + tonic_pc as i32;
    let mut out = [0i32; 7];
    for (i, interval) in mode.intervals().iter().enumerate() {
        out[i] = base_midi + interval;
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Triad,
    Seventh,
}

/// Diatonic chord tones for `degree` (1-7) built by stacking thirds on the
/// scale, e.g. triad = {d, d+2, d+4}, seventh = {d, d+2, d+4, d+6}.
pub fn chord_notes(tonic_pc: u8, mode: Mode, degree: u8, quality: ChordQuality, octave: i32) -> Vec<i32> {
    let scale = scale_degrees(tonic_pc, mode, octave);
    let degree_idx = (degree.saturating_sub(1) % 7) as usize;
    let stack_len = match quality {
        ChordQuality::Triad => 3,
        ChordQuality::Seventh => 4,
    };
    (0..stack_len)
        .map(|i| {
            let idx = (degree_idx + i * 2) % 7;
            let octave_bump = ((degree_idx + i * 2) / 7) as i32;
            scale[idx] + 12 * octave_bump
        })
        .collect()
}

/// Quality of a stacked-third chord, derived from the interval pattern rather
/// than a fixed per-mode table, so it is correct for all seven modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriadQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

pub fn triad_quality(tones: &[i32]) -> TriadQuality {
    if tones.len() < 3 {
        return TriadQuality::Major;
    }
    let third = (tones[1] - tones[0]).rem_euclid(12);
    let fifth = (tones[2] - tones[0]).rem_euclid(12);
    match (third, fifth) {
        (4, 7) => TriadQuality::Major,
        (3, 7) => TriadQuality::Minor,
        (3, 6) => TriadQuality::Diminished,
        (4, 8) => TriadQuality::Augmented,
        (4, _) => TriadQuality::Major,
        _ => TriadQuality::Minor,
    }
}

/// A parsed roman numeral: scale degree, accidental shift, and trailing
/// quality annotation (e.g. "7", "dim", "sus").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomanNumeral {
    pub degree: u8,
    pub accidental: i8,
    pub suffix: String,
    pub explicit_lower: bool,
}

impl RomanNumeral {
    pub fn parse(raw: &str) -> Self {
        let mut rest = raw;
        let mut accidental = 0i8;
        if let Some(r) = rest.strip_prefix('b') {
            accidental = -1;
            rest = r;
        } else if let Some(r) = rest.strip_prefix('#') {
            accidental = 1;
            rest = r;
        }

        let letters_len = rest
            .chars()
            .take_while(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V'))
            .count();
        let (roman_part, suffix) = rest.split_at(letters_len);
        let degree = roman_letters_to_degree(roman_part);
        let explicit_lower = roman_part.chars().next().is_some_and(|c| c.is_lowercase());

        RomanNumeral {
            degree,
            accidental,
            suffix: suffix.to_string(),
            explicit_lower,
        }
    }

    pub fn is_seventh(&self) -> bool {
        self.suffix.contains('7')
    }
}

fn roman_letters_to_degree(roman: &str) -> u8 {
    match roman.to_ascii_uppercase().as_str() {
        "I" => 1,
        "II" => 2,
        "III" => 3,
        "IV" => 4,
        "V" => 5,
        "VI" => 6,
        "VII" => 7,
        _ => 1,
    }
}

/// Scale degree (1-7) for a roman numeral such as "I", "vi", "V7", "bVII".
pub fn roman_to_degree(roman: &str) -> u8 {
    RomanNumeral::parse(roman).degree
}

/// A readable chord name (e.g. "Am", "G7", "Bbdim") for a roman numeral
/// resolved against a key.
pub fn roman_to_chord_name(tonic_pc: u8, mode: Mode, roman: &str) -> String {
    let parsed = RomanNumeral::parse(roman);
    let scale = scale_degrees(tonic_pc, mode, 4);
    let degree_idx = (parsed.degree.saturating_sub(1) % 7) as usize;
    let root_pc = (scale[degree_idx] + parsed.accidental as i32).rem_euclid(12) as u8;

    let quality = triad_quality(&chord_notes(tonic_pc, mode, parsed.degree, ChordQuality::Triad, 4));
    let mut name = pitch_class_name(root_pc).to_string();
    match quality {
        TriadQuality::Major => {}
        TriadQuality::Minor => name.push('m'),
        TriadQuality::Diminished => name.push_str("dim"),
        TriadQuality::Augmented => name.push_str("aug"),
    }
    if parsed.is_seventh() {
        name.push('7');
    }
    name
}

/// The relative major/minor of `tonic`/`mode`; modes other than ionian and
/// aeolian have no standard relative and are returned unchanged.
pub fn relative_key(tonic_pc: u8, mode: Mode) -> (u8, Mode) {
    match mode {
        Mode::Ionian => {
            let scale = scale_degrees(tonic_pc, mode, 4);
            ((scale[5] - MIDDLE_C).rem_euclid(12) as u8, Mode::Aeolian)
        }
        Mode::Aeolian => {
            let scale = scale_degrees(tonic_pc, mode, 4);
            ((scale[2] - MIDDLE_C).rem_euclid(12) as u8, Mode::Ionian)
        }
        other => (tonic_pc, other),
    }
}

/// Pitch class a perfect fifth above `tonic_pc` (the dominant key).
pub fn dominant_pc(tonic_pc: u8) -> u8 {
    (tonic_pc as i32 + 7).rem_euclid(12) as u8
}

/// Pitch class a perfect fifth below `tonic_pc` (the subdominant key).
pub fn subdominant_pc(tonic_pc: u8) -> u8 {
    (tonic_pc as i32 - 7).rem_euclid(12) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sharps_and_flats() {
        assert_eq!(parse_tonic("C").unwrap(), 0);
        assert_eq!(parse_tonic("F#").unwrap(), 6);
        assert_eq!(parse_tonic("Bb").unwrap(), 10);
        assert_eq!(parse_tonic("Cb").unwrap(), 11);
    }

    #[test]
    fn c_ionian_scale_matches_s2() {
        let tonic = parse_tonic("C").unwrap();
        assert_eq!(scale_degrees(tonic, Mode::Ionian, 4), [60, 62, 64, 65, 67, 69, 71]);
    }

    #[test]
    fn triad_degree_5_matches_s3() {
        let tonic = parse_tonic("C").unwrap();
        let notes = chord_notes(tonic, Mode::Ionian, 5, ChordQuality::Triad, 4);
        assert_eq!(notes, vec![67, 71, 74]);
    }

    #[test]
    fn roman_parses_accidentals_and_sevenths() {
        let r = RomanNumeral::parse("bVII");
        assert_eq!(r.degree, 7);
        assert_eq!(r.accidental, -1);

        let r = RomanNumeral::parse("V7");
        assert_eq!(r.degree, 5);
        assert!(r.is_seventh());

        let r = RomanNumeral::parse("vi");
        assert_eq!(r.degree, 6);
        assert!(r.explicit_lower);
    }

    #[test]
    fn vi_in_c_major_is_a_minor() {
        let tonic = parse_tonic("C").unwrap();
        assert_eq!(roman_to_chord_name(tonic, Mode::Ionian, "vi"), "Am");
        assert_eq!(roman_to_chord_name(tonic, Mode::Ionian, "V7"), "G7");
    }

    #[test]
    fn relative_minor_of_c_is_a_aeolian() {
        let tonic = parse_tonic("C").unwrap();
        let (rel_pc, rel_mode) = relative_key(tonic, Mode::Ionian);
        assert_eq!(rel_pc, 9);
        assert_eq!(rel_mode, Mode::Aeolian);
    }
}
