// The output contract: events, track metadata, and the performance wrapper.
//
// The scheduler appends immutable events to an ordered stream; the renderer
// consumes them along with run-level metadata (tempo, per-track channel and
// program assignments). Times and durations are in quarter-note beats so
// the renderer can retime freely from the tempo.
//
// Events are never mutated after creation. Velocity 0 never appears here —
// a silent lane simply emits nothing for that step.
//
// See also: `schedule.rs` (producer) and `midi.rs` (the in-repo renderer).

use serde::{Deserialize, Serialize};

/// The four logical output tracks, in renderer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Track {
    Lead = 0,
    Bass = 1,
    Pad = 2,
    Drums = 3,
}

impl Track {
    pub const ALL: [Track; 4] = [Track::Lead, Track::Bass, Track::Pad, Track::Drums];

    pub fn index(self) -> usize {
        self as usize
    }

    /// MIDI channel assignment. Drums sit on the General MIDI percussion
    /// channel; melodic tracks take the low channels in order.
    pub fn channel(self) -> u8 {
        match self {
            Track::Lead => 0,
            Track::Bass => 1,
            Track::Pad => 2,
            Track::Drums => 9,
        }
    }

    /// General MIDI program for melodic tracks; `None` for percussion.
    pub fn program(self) -> Option<u8> {
        match self {
            Track::Lead => Some(0),  // acoustic grand piano
            Track::Bass => Some(29), // overdriven guitar
            Track::Pad => Some(90),  // pad 3 (polysynth)
            Track::Drums => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Track::Lead => "Lead",
            Track::Bass => "Bass",
            Track::Pad => "Pad",
            Track::Drums => "Drums",
        }
    }
}

/// One emitted musical event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// A pitched note on a melodic track.
    Note {
        track: Track,
        channel: u8,
        pitch: u8,
        start_time: f64,
        duration: f64,
        velocity: u8,
    },
    /// A percussion hit, keyed by General MIDI drum number.
    DrumHit {
        track: Track,
        key: u8,
        start_time: f64,
        duration: f64,
        velocity: u8,
    },
}

impl Event {
    /// The logical track this event belongs to.
    pub fn track(&self) -> Track {
        match self {
            Event::Note { track, .. } | Event::DrumHit { track, .. } => *track,
        }
    }

    pub fn start_time(&self) -> f64 {
        match self {
            Event::Note { start_time, .. } | Event::DrumHit { start_time, .. } => *start_time,
        }
    }

    pub fn velocity(&self) -> u8 {
        match self {
            Event::Note { velocity, .. } | Event::DrumHit { velocity, .. } => *velocity,
        }
    }
}

/// A complete generated performance: the ordered event stream plus the
/// metadata the renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Fixed run tempo in quarter notes per minute.
    pub tempo_bpm: u16,
    pub events: Vec<Event>,
}

impl Performance {
    /// Count events per kind and track for diagnostics.
    pub fn stats(&self) -> PerformanceStats {
        let mut per_track = [0usize; 4];
        let mut notes = 0;
        let mut drum_hits = 0;
        for event in &self.events {
            per_track[event.track().index()] += 1;
            match event {
                Event::Note { .. } => notes += 1,
                Event::DrumHit { .. } => drum_hits += 1,
            }
        }
        PerformanceStats {
            total_events: self.events.len(),
            notes,
            drum_hits,
            per_track,
        }
    }
}

/// Statistics about a performance's contents.
#[derive(Debug)]
pub struct PerformanceStats {
    pub total_events: usize,
    pub notes: usize,
    pub drum_hits: usize,
    /// Event counts indexed by `Track::index()`.
    pub per_track: [usize; 4],
}
