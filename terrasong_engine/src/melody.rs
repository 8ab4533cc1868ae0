// Melodic voice logic: one normalized deviation score in, one pitch out.
//
// Each `MelodyVoice` tracks its own recent history and fights monotony two
// ways:
// - Anti-repetition: landing on the same scale degree twice in a row gets
//   nudged a step up or down (direction drawn fresh each time).
// - Boredom jumps: when the last four degrees show two or fewer distinct
//   values, the voice leaps by a fixed offset to break the rut. The caller
//   learns about the jump through the returned flag and can rest the note
//   or boost its velocity.
//
// The voice is pure given its state and the injected rng: same inputs, same
// seed, same pitches. State lives for one generation run — a fresh scheduler
// starts fresh voices.
//
// See also: `scale.rs` for the pitch table, `schedule.rs` for how the two
// voice instances (lead and bass) are driven.

use crate::scale::{Register, SCALE};
use rand::Rng;

/// How many recent degrees a voice remembers.
const HISTORY_LEN: usize = 6;
/// How many trailing degrees the boredom check inspects.
const BOREDOM_WINDOW: usize = 4;
/// Degree offsets (not semitones) a bored voice may jump by.
const BOREDOM_JUMPS: [i64; 4] = [2, 4, 7, -5];

/// Fixed-capacity FIFO of recently chosen scale degrees.
///
/// Holds at most `HISTORY_LEN` entries; pushing beyond that evicts the
/// oldest. Never grows.
#[derive(Debug, Clone, Default)]
struct DegreeHistory {
    entries: [usize; HISTORY_LEN],
    head: usize,
    len: usize,
}

impl DegreeHistory {
    fn push(&mut self, degree: usize) {
        if self.len < HISTORY_LEN {
            self.entries[(self.head + self.len) % HISTORY_LEN] = degree;
            self.len += 1;
        } else {
            // Full: overwrite the oldest entry and advance the head.
            self.entries[self.head] = degree;
            self.head = (self.head + 1) % HISTORY_LEN;
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Iterate stored degrees from oldest to newest.
    fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |i| self.entries[(self.head + i) % HISTORY_LEN])
    }
}

/// A single melodic decision-maker. The scheduler owns two: lead and bass.
#[derive(Debug, Clone, Default)]
pub struct MelodyVoice {
    last_degree: Option<usize>,
    history: DegreeHistory,
}

impl MelodyVoice {
    pub fn new() -> Self {
        MelodyVoice::default()
    }

    /// Choose the next pitch for a deviation score within a register.
    ///
    /// Returns the MIDI pitch and whether a boredom jump fired. Never fails;
    /// the result is always some entry of `SCALE`.
    pub fn next_pitch(
        &mut self,
        zscore: f64,
        register: Register,
        rng: &mut impl Rng,
    ) -> (u8, bool) {
        // Roughly ±2 standard deviations map onto the register's full span.
        let norm = ((zscore + 2.0) / 4.0).clamp(0.0, 1.0);
        let (lo, hi) = register.bounds();
        let mut target = (lo as f64 + norm * (hi - lo) as f64) as usize;
        target = target.min(SCALE.len() - 1);

        let boring = self.is_boring();
        if boring {
            let jump = BOREDOM_JUMPS[rng.random_range(0..BOREDOM_JUMPS.len())];
            target = clamp_degree(target as i64 + jump);
        } else if self.last_degree == Some(target) {
            // Never repeat a degree on consecutive calls; step off either way.
            let nudge = if rng.random_bool(0.5) { 1 } else { -1 };
            target = clamp_degree(target as i64 + nudge);
        }

        let pitch = SCALE[target];
        self.last_degree = Some(target);
        self.history.push(target);
        (pitch, boring)
    }

    /// True when the trailing window shows two or fewer distinct degrees.
    /// Needs a full window of history before it can fire.
    fn is_boring(&self) -> bool {
        if self.history.len() < BOREDOM_WINDOW {
            return false;
        }
        let mut seen = [0usize; BOREDOM_WINDOW];
        let mut distinct = 0;
        for degree in self.history.iter().skip(self.history.len() - BOREDOM_WINDOW) {
            if !seen[..distinct].contains(&degree) {
                seen[distinct] = degree;
                distinct += 1;
            }
        }
        distinct <= 2
    }
}

fn clamp_degree(degree: i64) -> usize {
    degree.clamp(0, SCALE.len() as i64 - 1) as usize
}
