//! Tick arithmetic shared by every generator and the export layer.
//!
//! Grounded on `music/ticks.py`.

/// Ticks per quarter note. Fixed across the whole engine.
pub const PPQ: i64 = 480;

/// Ticks in one bar of `num/den` time, e.g. `ticks_per_bar(4,4) == 1920`.
pub fn ticks_per_bar(num: u8, den: u8) -> i64 {
    ((num as f64) * 4.0 / (den as f64) * PPQ as f64).floor() as i64
}

/// Absolute tick at which `bar_index` (0-based) starts.
pub fn clip_start_tick(bar_index: u32, num: u8, den: u8) -> i64 {
    bar_index as i64 * ticks_per_bar(num, den)
}

/// `clip_start_tick` plus every applicable offset, in the order the export
/// layer composes them (clip offset, then track offset).
pub fn absolute_tick(bar_start_tick: i64, relative_tick: i64, clip_offset: i64, track_offset: i64) -> i64 {
    bar_start_tick + relative_tick + clip_offset + track_offset
}

pub fn beats_to_ticks(beats: f64) -> i64 {
    (beats * PPQ as f64).round_ties_even() as i64
}

pub fn ticks_to_beats(ticks: i64) -> f64 {
    ticks as f64 / PPQ as f64
}

pub fn seconds_to_ticks(seconds: f64, bpm: f64) -> i64 {
    let beats = seconds * bpm / 60.0;
    beats_to_ticks(beats)
}

pub fn ticks_to_seconds(ticks: i64, bpm: f64) -> f64 {
    ticks_to_beats(ticks) * 60.0 / bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_four_bar_is_1920_ticks() {
        assert_eq!(ticks_per_bar(4, 4), 1920);
    }

    #[test]
    fn three_four_bar_is_1440_ticks() {
        assert_eq!(ticks_per_bar(3, 4), 1440);
    }

    #[test]
    fn beats_round_trip_through_seconds() {
        let ticks = seconds_to_ticks(2.0, 120.0);
        assert_eq!(ticks, 1920);
        assert!((ticks_to_seconds(ticks, 120.0) - 2.0).abs() < 1e-9);
    }
}
