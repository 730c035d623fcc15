//! Multi-lane polyrhythm rendering: per-lane Euclidean cycles aligned to an
//! LCM grid, deterministic humanization, and all-or-none mute/solo.
//!
//! Grounded on `music/polyrhythm.py`.

use reel_rng::SeededRng;

use crate::euclidean::bjorklund;
use crate::timebase::PPQ;
use crate::GeneratedNote;

#[derive(Debug, Clone)]
pub struct CycleSpec {
    pub steps: u32,
    pub pulses: u32,
    pub cycle_beats: f64,
    pub rotation: u32,
    pub swing: Option<f64>,
}

impl CycleSpec {
    pub fn step_ticks(&self) -> i64 {
        (self.cycle_beats * PPQ as f64 / self.steps as f64).floor() as i64
    }

    pub fn cycle_ticks(&self) -> i64 {
        self.step_ticks() * self.steps as i64
    }

    /// Render one repeating cycle over `[clip_start_tick, clip_end_tick)`,
    /// returning relative-to-clip start ticks of every active step.
    pub fn render_to_events(&self, clip_start_tick: i64, clip_end_tick: i64) -> Vec<i64> {
        let pattern = bjorklund(self.steps, self.pulses, self.rotation);
        let step_ticks = self.step_ticks();
        let cycle_ticks = self.cycle_ticks();
        if cycle_ticks <= 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut cycle_start = clip_start_tick;
        while cycle_start < clip_end_tick {
            for (i, active) in pattern.iter().enumerate() {
                if !active {
                    continue;
                }
                let mut tick = cycle_start + i as i64 * step_ticks;
                if let Some(swing) = self.swing {
                    if i % 2 == 1 {
                        tick += (step_ticks as f64 * swing * 0.5).floor() as i64;
                    }
                }
                if tick < clip_end_tick {
                    out.push(tick - clip_start_tick);
                }
            }
            cycle_start += cycle_ticks;
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct LaneSpec {
    pub cycle: CycleSpec,
    pub pitch: u8,
    pub velocity: u8,
    pub mute: bool,
    pub solo: bool,
    pub order_index: u32,
    pub seed: u64,
    pub humanize_ticks: i32,
    pub duration_tick: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub lcm_steps: u32,
    pub grid_steps_per_bar: u32,
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: u32, b: u32) -> u32 {
    if a == 0 || b == 0 {
        0
    } else {
        a / gcd(a, b) * b
    }
}

/// `lcm_steps = lcm({lane.steps})`, display grid clamped to a minimum of 16.
pub fn lcm_grid_for_lanes(lanes: &[LaneSpec]) -> GridSpec {
    let lcm_steps = lanes.iter().map(|l| l.cycle.steps).fold(1, lcm);
    GridSpec {
        lcm_steps,
        grid_steps_per_bar: lcm_steps.max(16),
    }
}

/// Render every lane into a merged, sorted event list, honoring all-or-none
/// solo semantics and deterministic humanization.
pub fn render_lanes_to_events(lanes: &[LaneSpec], clip_start_tick: i64, clip_end_tick: i64) -> Vec<GeneratedNote> {
    let any_solo = lanes.iter().any(|l| l.solo);
    let mut events = Vec::new();
    for lane in lanes {
        if lane.mute {
            continue;
        }
        if any_solo && !lane.solo {
            continue;
        }
        let mut rng = SeededRng::from_seed_u64(lane.seed);
        let clip_len = clip_end_tick - clip_start_tick;
        for relative_tick in lane.cycle.render_to_events(clip_start_tick, clip_end_tick) {
            let jitter = rng.jitter_ticks(lane.humanize_ticks);
            let max_start = (clip_len - lane.duration_tick).max(0);
            let start = (relative_tick + jitter as i64).clamp(0, max_start);
            events.push(GeneratedNote {
                start_tick: start,
                duration_tick: lane.duration_tick,
                pitch: lane.pitch,
                velocity: lane.velocity,
                order_index: lane.order_index,
            });
        }
    }
    events.sort_by(|a, b| {
        a.start_tick
            .cmp(&b.start_tick)
            .then(a.order_index.cmp(&b.order_index))
            .then(a.pitch.cmp(&b.pitch))
    });
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(steps: u32, pulses: u32, seed: u64, order_index: u32) -> LaneSpec {
        LaneSpec {
            cycle: CycleSpec {
                steps,
                pulses,
                cycle_beats: 4.0,
                rotation: 0,
                swing: None,
            },
            pitch: 60,
            velocity: 100,
            mute: false,
            solo: false,
            order_index,
            seed,
            humanize_ticks: 0,
            duration_tick: 60,
        }
    }

    #[test]
    fn s7_lcm_for_3_4_5_is_60() {
        let lanes = vec![lane(3, 2, 1, 0), lane(4, 2, 2, 1), lane(5, 2, 3, 2)];
        assert_eq!(lcm_grid_for_lanes(&lanes).lcm_steps, 60);
    }

    #[test]
    fn solo_is_all_or_none() {
        let mut lanes = vec![lane(4, 2, 1, 0), lane(4, 2, 2, 1)];
        lanes[0].solo = true;
        let events = render_lanes_to_events(&lanes, 0, 1920);
        assert!(events.iter().all(|e| e.pitch == 60));
        let solo_only_count = render_lanes_to_events(&lanes, 0, 1920).len();
        lanes[0].solo = false;
        let no_solo_count = render_lanes_to_events(&lanes, 0, 1920).len();
        assert!(no_solo_count >= solo_only_count);
    }

    #[test]
    fn events_are_sorted_and_in_bounds() {
        let lanes = vec![lane(5, 3, 7, 0), lane(7, 3, 9, 1)];
        let events = render_lanes_to_events(&lanes, 0, 3840);
        for w in events.windows(2) {
            assert!(w[0].start_tick <= w[1].start_tick);
        }
        for e in &events {
            assert!(e.start_tick >= 0 && e.start_tick < 3840);
        }
    }
}
