// Shared velocity shaping: volume-to-velocity maps and humanization.
//
// Every lane derives its MIDI velocity from a channel volume through a
// linear map, then jitters it so repeated hits never land at mechanically
// identical loudness. Velocity 0 is reserved to mean "no event" and passes
// through humanization untouched; audible velocities stay in [1, 127].

use rand::Rng;

/// Base velocity for melodic notes.
const MELODY_BASE: f64 = 65.0;
/// Elevated base used when a boredom jump should stand out.
const MELODY_BASE_BOOSTED: f64 = 85.0;
/// Volume-to-velocity slope for melodic notes.
const MELODY_SCALE: f64 = 40.0;

/// Humanization jitter bound, in velocity units either direction.
const JITTER: i16 = 8;

/// Map a melodic channel volume onto a velocity. `boost` raises the base so
/// a compensating jump after a boring stretch lands audibly louder.
pub fn melody_velocity(volume: f64, boost: bool) -> u8 {
    let base = if boost {
        MELODY_BASE_BOOSTED
    } else {
        MELODY_BASE
    };
    (base + volume * MELODY_SCALE).clamp(1.0, 127.0) as u8
}

/// Generic linear volume-to-velocity map for the drum and pad lanes.
pub fn lane_velocity(base: f64, scale: f64, volume: f64) -> u8 {
    (base + volume * scale).clamp(1.0, 127.0) as u8
}

/// Perturb a velocity by a symmetric jitter in [-8, +8], clamped to
/// [1, 127]. Zero means "no event" and is returned unchanged.
pub fn humanize(velocity: u8, rng: &mut impl Rng) -> u8 {
    if velocity == 0 {
        return 0;
    }
    let jitter = rng.random_range(-JITTER..=JITTER);
    (velocity as i16 + jitter).clamp(1, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn melody_velocity_bases() {
        assert_eq!(melody_velocity(0.0, false), 65);
        assert_eq!(melody_velocity(0.0, true), 85);
        assert_eq!(melody_velocity(0.5, false), 85);
    }

    #[test]
    fn velocity_maps_clamp_high() {
        assert_eq!(melody_velocity(10.0, true), 127);
        assert_eq!(lane_velocity(90.0, 30.0, 5.0), 127);
    }

    #[test]
    fn humanize_preserves_silence() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(humanize(0, &mut rng), 0);
        }
    }

    #[test]
    fn humanize_stays_bounded() {
        let mut rng = StdRng::seed_from_u64(2);
        for velocity in [1u8, 5, 64, 120, 127] {
            for _ in 0..200 {
                let out = humanize(velocity, &mut rng);
                assert!((1..=127).contains(&out), "velocity {out} out of range");
                let drift = (out as i16 - velocity as i16).abs();
                assert!(drift <= JITTER, "drift {drift} exceeds jitter");
            }
        }
    }
}
