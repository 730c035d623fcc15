//! Bjorklund euclidean rhythm generation with rotation.
//!
//! Grounded on `music/rhythm.py`'s bucket-accumulator Bjorklund
//! implementation.

/// A boolean step vector of length `steps` with exactly `pulses` active
/// steps, maximally evenly distributed, then rotated left by `rotation`.
pub fn bjorklund(steps: u32, pulses: u32, rotation: u32) -> Vec<bool> {
    if steps == 0 {
        return Vec::new();
    }
    let pulses = pulses.min(steps);
    let mut pattern = Vec::with_capacity(steps as usize);
    let mut bucket = pulses;
    for _ in 0..steps {
        bucket += pulses;
        if bucket >= steps {
            bucket -= steps;
            pattern.push(true);
        } else {
            pattern.push(false);
        }
    }
    rotate_left(&pattern, rotation)
}

fn rotate_left(pattern: &[bool], rotation: u32) -> Vec<bool> {
    if pattern.is_empty() {
        return Vec::new();
    }
    let r = (rotation as usize) % pattern.len();
    let mut rotated = pattern[r..].to_vec();
    rotated.extend_from_slice(&pattern[..r]);
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_euclidean_8_3() {
        let pattern = bjorklund(8, 3, 0);
        let bits: Vec<u8> = pattern.iter().map(|&b| b as u8).collect();
        assert_eq!(bits, vec![0, 1, 0, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn s4_bjorklund_16_5_has_exactly_5_pulses() {
        let pattern = bjorklund(16, 5, 0);
        assert_eq!(pattern.iter().filter(|&&b| b).count(), 5);
    }

    #[test]
    fn pulses_count_is_invariant_under_rotation() {
        for rotation in 0..16 {
            let pattern = bjorklund(16, 5, rotation);
            assert_eq!(pattern.iter().filter(|&&b| b).count(), 5);
        }
    }

    #[test]
    fn pulses_never_exceed_steps() {
        let pattern = bjorklund(4, 9, 0);
        assert_eq!(pattern.len(), 4);
        assert_eq!(pattern.iter().filter(|&&b| b).count(), 4);
    }
}
