// Terrasong Engine
//
// A sonification engine that turns satellite spectral-index time series into
// multi-track symbolic music. Upstream, a feature extractor walks satellite
// scenes and emits one JSON record per time step: melodic channels (ndvi,
// ndbi, ndwi — each a volume plus a z-score) and rhythm-trigger scalars
// (kick, snare, hihat). This crate consumes those records in order and
// schedules a four-track performance: lead and bass voices that pitch
// themselves from z-scores with anti-boredom correction, a volume-driven
// sustain pad, and a pattern-based drum sequencer with phrase-level
// hysteresis, bar-end fills, and cooldown-gated crash accents.
//
// Architecture:
// - scale.rs: The fixed pitch table (C minor blues across four octaves) and
//   register windows
// - feature.rs: Typed input records and score-file loading (serde)
// - dynamics.rs: Volume-to-velocity curves and humanization jitter
// - melody.rs: Per-voice pitch selection with bounded history and boredom
//   jumps
// - drums.rs: Step sequencer (pattern tables, phrase hysteresis, fills,
//   crash cooldown)
// - event.rs: Emitted events, track metadata, and the Performance container
// - schedule.rs: The orchestrator walking records and driving every lane
// - midi.rs: Standard MIDI File output from completed performances
//
// The engine is deterministic given a seed, supporting reproducible output.

pub mod drums;
pub mod dynamics;
pub mod event;
pub mod feature;
pub mod melody;
pub mod midi;
pub mod scale;
pub mod schedule;
