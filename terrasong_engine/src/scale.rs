// The fixed pitch palette for all melodic decisions.
//
// Every pitched note the engine emits is drawn from one 24-degree table: a
// C minor blues hexatonic (C, Eb, F, F#, G, Bb) laid out across four octaves.
// Melodic voices never compute pitches directly — they pick an index into
// this table, which keeps every voice consonant with every other by
// construction no matter how the input data moves.
//
// `Register` names the three overlapping index windows a voice can be
// confined to. The windows are wide enough to share degrees (mid overlaps
// both neighbors), so two voices in adjacent registers can still meet.
//
// See also: `melody.rs`, which owns the index-selection logic.

use serde::{Deserialize, Serialize};

/// The fixed 24-degree pitch palette: C minor blues across four octaves.
///
/// Strictly increasing, read-only for the lifetime of the process.
pub const SCALE: [u8; 24] = [
    48, 51, 53, 54, 55, 58, // C3 octave (low)
    60, 63, 65, 66, 67, 70, // C4 octave (low-mid)
    72, 75, 77, 78, 79, 82, // C5 octave (high-mid)
    84, 87, 89, 90, 91, 94, // C6 octave (top)
];

/// The sub-range of the palette a melodic decision draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Register {
    Low,
    Mid,
    High,
}

impl Register {
    /// Inclusive `(low, high)` index bounds into `SCALE` for this register.
    pub fn bounds(self) -> (usize, usize) {
        match self {
            Register::Low => (0, 12),
            Register::Mid => (6, 18),
            Register::High => (12, SCALE.len() - 1),
        }
    }
}
