// Drum sequencing: a state machine over 16-step bars and 4-bar phrases.
//
// Each call to `next_hits` answers "which articulations sound on this step"
// from three pieces of state:
// - `current_pattern`: one of three base grooves, reselected from the
//   intensity signal only at 4-bar phrase boundaries. The hysteresis keeps
//   the groove steady while per-step intensity fluctuates.
// - the fill-in override: the tail of every phrase's last bar swaps in a
//   fixed escalating figure, signalling the turnover for every groove.
// - `crash_cooldown`: accent arbitration. A crash request succeeds only when
//   the cooldown has run out, then rearms it for two bars. The counter
//   decrements exactly once per `next_hits` call.
//
// Pattern tables are closed constant arrays, one hit-slice per step.
//
// See also: `schedule.rs`, which maps hit kinds to keys and velocities.

use HitKind::{ClosedHat as H, Kick as K, OpenHat as O, Snare as S};

/// Steps per bar (sixteenth-note grid in 4/4).
const STEPS_PER_BAR: usize = 16;
/// Bars per phrase; pattern selection and fill-ins key off this.
const BARS_PER_PHRASE: u32 = 4;
/// Steps a crash stays rearmed after firing — two full bars.
const CRASH_COOLDOWN_STEPS: u32 = 32;

/// One percussion articulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    Kick,
    Snare,
    ClosedHat,
    OpenHat,
}

impl HitKind {
    /// General MIDI percussion key for this articulation.
    pub fn gm_key(self) -> u8 {
        match self {
            HitKind::Kick => 36,
            HitKind::Snare => 38,
            HitKind::ClosedHat => 42,
            HitKind::OpenHat => 46,
        }
    }
}

/// General MIDI crash cymbal, used by the accent lane.
pub const CRASH_KEY: u8 = 49;

/// The three base grooves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumPattern {
    /// Four-on-the-floor backbeat; the calm default.
    Basic,
    /// Syncopated kick placement for moderate intensity.
    Groove,
    /// Dense snare chatter with an open-hat tail for peaks.
    Break,
}

const BASIC: [&[HitKind]; STEPS_PER_BAR] = [
    &[K, H], &[H], &[S, H], &[H],
    &[K, H], &[H], &[S, H], &[H],
    &[K, H], &[H], &[S, H], &[H],
    &[K, H], &[H], &[S, H], &[H],
];

const GROOVE: [&[HitKind]; STEPS_PER_BAR] = [
    &[K, H], &[H], &[S, H], &[K],
    &[H], &[K, H], &[S, H], &[H],
    &[K, H], &[H], &[S, H], &[K],
    &[H], &[K], &[S, H], &[H],
];

const BREAK: [&[HitKind]; STEPS_PER_BAR] = [
    &[K, H], &[S], &[H], &[S],
    &[K, H], &[S], &[H], &[S],
    &[K, H], &[H], &[S, H], &[K],
    &[K, H], &[S], &[H], &[O],
];

/// Fill figure replacing steps 12-15 of each phrase's final bar.
const FILL_IN: [&[HitKind]; 4] = [&[S], &[S], &[K, S], &[O]];

impl DrumPattern {
    fn table(self) -> &'static [&'static [HitKind]; STEPS_PER_BAR] {
        match self {
            DrumPattern::Basic => &BASIC,
            DrumPattern::Groove => &GROOVE,
            DrumPattern::Break => &BREAK,
        }
    }
}

/// The percussion state machine. One instance per generation run.
#[derive(Debug, Clone)]
pub struct DrumSequencer {
    bar_count: u32,
    current_pattern: DrumPattern,
    crash_cooldown: u32,
}

impl Default for DrumSequencer {
    fn default() -> Self {
        DrumSequencer::new()
    }
}

impl DrumSequencer {
    pub fn new() -> Self {
        DrumSequencer {
            bar_count: 0,
            current_pattern: DrumPattern::Basic,
            crash_cooldown: 0,
        }
    }

    /// The hits sounding on one step.
    ///
    /// Must be called once per step in increasing order: it advances the bar
    /// counter, applies the per-step cooldown decrement, and reconsiders the
    /// pattern at phrase boundaries.
    pub fn next_hits(&mut self, step_index: u32, intensity: f64) -> &'static [HitKind] {
        let step_in_bar = step_index as usize % STEPS_PER_BAR;

        if self.crash_cooldown > 0 {
            self.crash_cooldown -= 1;
        }

        if step_in_bar == 0 && step_index > 0 {
            self.bar_count += 1;
            if self.bar_count % BARS_PER_PHRASE == 0 {
                self.current_pattern = if intensity > 0.5 {
                    DrumPattern::Break
                } else if intensity > 0.2 {
                    DrumPattern::Groove
                } else {
                    DrumPattern::Basic
                };
            }
        }

        // Last bar of the phrase ends on the fill, whatever the groove.
        if (self.bar_count + 1) % BARS_PER_PHRASE == 0 && step_in_bar >= 12 {
            return FILL_IN[step_in_bar - 12];
        }

        self.current_pattern.table()[step_in_bar]
    }

    /// Cooldown-gated accent arbitration.
    ///
    /// Succeeds only when the cooldown has fully run out, then rearms it.
    /// Call at most once per step, after that step's `next_hits`.
    pub fn try_trigger_accent(&mut self) -> bool {
        if self.crash_cooldown == 0 {
            self.crash_cooldown = CRASH_COOLDOWN_STEPS;
            true
        } else {
            false
        }
    }

    /// The groove held for the current phrase.
    pub fn current_pattern(&self) -> DrumPattern {
        self.current_pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_pattern_keeps_the_backbeat() {
        // Kick on every quarter, snare on the backbeats, hats throughout.
        let table = DrumPattern::Basic.table();
        for quarter in 0..4 {
            assert!(table[quarter * 4].contains(&K));
            assert!(table[quarter * 4 + 2].contains(&S));
        }
        for step in table.iter().take(STEPS_PER_BAR) {
            assert!(step.contains(&H) || step.contains(&O));
        }
    }

    #[test]
    fn pattern_changes_only_at_phrase_boundaries() {
        let mut seq = DrumSequencer::new();
        let mut last = seq.current_pattern();
        for step in 0..256u32 {
            // Intensity flips wildly every step; only boundaries may react.
            let intensity = if step % 2 == 0 { 0.9 } else { 0.05 };
            seq.next_hits(step, intensity);
            let now = seq.current_pattern();
            if now != last {
                assert_eq!(step % 16, 0, "pattern changed mid-bar at step {step}");
                assert_eq!(
                    (step / 16) % BARS_PER_PHRASE,
                    0,
                    "pattern changed mid-phrase at step {step}"
                );
                last = now;
            }
        }
        // The boundary at step 64 saw intensity 0.9, so the change did happen.
        assert_eq!(seq.current_pattern(), DrumPattern::Break);
    }

    #[test]
    fn intensity_thresholds_select_patterns() {
        // Hold a constant intensity until the first selection point (bar 4,
        // step 64) and check which groove it picks.
        for (intensity, expected) in [
            (0.1, DrumPattern::Basic),
            (0.3, DrumPattern::Groove),
            (0.7, DrumPattern::Break),
        ] {
            let mut seq = DrumSequencer::new();
            for step in 0..=64u32 {
                seq.next_hits(step, intensity);
            }
            assert_eq!(seq.current_pattern(), expected, "intensity {intensity}");
        }
    }

    #[test]
    fn fill_in_replaces_the_phrase_tail() {
        let mut seq = DrumSequencer::new();
        let mut tail = Vec::new();
        for step in 0..64u32 {
            let hits = seq.next_hits(step, 0.0);
            if (60..64).contains(&step) {
                tail.push(hits);
            } else {
                // Everything else in the first phrase is the base pattern.
                assert_eq!(hits, BASIC[step as usize % 16], "step {step}");
            }
        }
        assert_eq!(tail, vec![&[S][..], &[S][..], &[K, S][..], &[O][..]]);
    }

    #[test]
    fn fill_in_is_identical_for_every_pattern() {
        // Drive intensity high so bar 4 switches to Break, then compare the
        // second phrase's fill to the first one's.
        let mut seq = DrumSequencer::new();
        let mut first = Vec::new();
        let mut second = Vec::new();
        for step in 0..128u32 {
            let hits = seq.next_hits(step, 0.9);
            match step {
                60..=63 => first.push(hits),
                124..=127 => second.push(hits),
                _ => {}
            }
        }
        assert_eq!(seq.current_pattern(), DrumPattern::Break);
        assert_eq!(first, second);
        assert_eq!(first[2], &[K, S][..]);
    }

    #[test]
    fn accent_cooldown_spans_two_bars() {
        let mut seq = DrumSequencer::new();
        seq.next_hits(0, 0.0);
        assert!(seq.try_trigger_accent(), "first request should fire");

        // Requests fail on the next 31 steps, then fire again exactly 32
        // steps (two bars) after the first.
        for step in 1..32u32 {
            seq.next_hits(step, 0.0);
            assert!(!seq.try_trigger_accent(), "step {step} should be gated");
        }
        seq.next_hits(32, 0.0);
        assert!(seq.try_trigger_accent(), "cooldown should expire at step 32");
    }

    #[test]
    fn failed_accent_request_has_no_side_effects() {
        let mut seq = DrumSequencer::new();
        seq.next_hits(0, 0.0);
        assert!(seq.try_trigger_accent());
        seq.next_hits(1, 0.0);
        // Repeated denied requests within one step leave the cooldown alone.
        assert!(!seq.try_trigger_accent());
        assert!(!seq.try_trigger_accent());
        for step in 2..33u32 {
            seq.next_hits(step, 0.0);
            let fired = seq.try_trigger_accent();
            assert_eq!(fired, step == 32, "unexpected result at step {step}");
        }
    }

    #[test]
    fn gm_keys_are_standard() {
        assert_eq!(HitKind::Kick.gm_key(), 36);
        assert_eq!(HitKind::Snare.gm_key(), 38);
        assert_eq!(HitKind::ClosedHat.gm_key(), 42);
        assert_eq!(HitKind::OpenHat.gm_key(), 46);
        assert_eq!(CRASH_KEY, 49);
    }
}
