// The typed input contract with the feature extractor.
//
// The extractor walks each satellite scene column by column and emits one
// JSON array per run. Every element is a `FeatureRecord`: per-channel
// spectral-index aggregates (ndvi/ndbi/ndwi, each a volume plus a z-score)
// and three rhythm-trigger scalars (kick/snare/hihat). The extractor's
// `time_step` advances by its frame interval (0, 10, 20, ...), but playback
// walks the records back to back: parsing assigns each record its dense
// ordinal as `step_index`, and the recorded value is kept as provenance
// only.
//
// Deserialization degrades rather than fails: a missing channel, group, or
// sub-field becomes the neutral default (0.0 / `None`), and unknown fields —
// the extractor also emits a `visuals` block for the video renderer — are
// ignored. Older score files used the key "ndmi" for the water channel; it
// is accepted as an alias for "ndwi".
//
// See also: `schedule.rs`, which consumes these records one per step.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// One channel's measurement for one time step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSample {
    /// Loudness-like signal, roughly in [0, 1] (the extractor does not
    /// hard-clamp it).
    #[serde(rename = "vol", default)]
    pub volume: f64,
    /// Deviation of the channel's raw index from its scene-wide mean, in
    /// standard deviations. Drives pitch placement.
    #[serde(default)]
    pub zscore: f64,
}

/// Names a melodic channel for configuration bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MelodyChannel {
    /// Vegetation index.
    Ndvi,
    /// Built-up index.
    Ndbi,
    /// Water index.
    Ndwi,
}

/// The melodic channel group of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MelodyChannels {
    #[serde(default)]
    pub ndvi: Option<ChannelSample>,
    #[serde(default)]
    pub ndbi: Option<ChannelSample>,
    /// Water channel. Accepts the legacy wire key "ndmi".
    #[serde(default, alias = "ndmi")]
    pub ndwi: Option<ChannelSample>,
}

impl MelodyChannels {
    /// Look up a channel by its configuration binding.
    pub fn get(&self, channel: MelodyChannel) -> Option<ChannelSample> {
        match channel {
            MelodyChannel::Ndvi => self.ndvi,
            MelodyChannel::Ndbi => self.ndbi,
            MelodyChannel::Ndwi => self.ndwi,
        }
    }
}

/// Names a rhythm channel for configuration bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RhythmChannel {
    Kick,
    Snare,
    Hihat,
}

/// The rhythm-trigger scalars of one record. Upstream these are thresholded
/// copies of the melodic volumes, so the drum section follows the same
/// terrain the voices sing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RhythmChannels {
    #[serde(default)]
    pub kick: f64,
    #[serde(default)]
    pub snare: f64,
    #[serde(default)]
    pub hihat: f64,
}

impl RhythmChannels {
    /// Look up a channel by its configuration binding.
    pub fn get(&self, channel: RhythmChannel) -> f64 {
        match channel {
            RhythmChannel::Kick => self.kick,
            RhythmChannel::Snare => self.snare,
            RhythmChannel::Hihat => self.hihat,
        }
    }

    /// Mean of the three triggers; drives drum pattern selection.
    pub fn intensity(&self) -> f64 {
        (self.kick + self.snare + self.hihat) / 3.0
    }
}

/// One time step of extracted features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Position in the run: the record's dense ordinal, assigned by
    /// `parse_score`. All scheduling (bar math, duty-cycle parity) keys off
    /// this value.
    #[serde(skip)]
    pub step_index: u32,
    /// The extractor's recorded scan position, strided by its frame
    /// interval. Provenance only; never fed into scheduling.
    #[serde(default)]
    pub time_step: u32,
    #[serde(default)]
    pub melody: MelodyChannels,
    #[serde(default)]
    pub rhythm: RhythmChannels,
}

/// Load one extractor score file (a JSON array of records).
pub fn load_score(path: &Path) -> Result<Vec<FeatureRecord>, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    parse_score(&data)
}

/// Parse score JSON and assign each record its dense `step_index`.
pub fn parse_score(data: &str) -> Result<Vec<FeatureRecord>, Box<dyn std::error::Error>> {
    let mut records: Vec<FeatureRecord> = serde_json::from_str(data)?;
    for (index, record) in records.iter_mut().enumerate() {
        record.step_index = index as u32;
    }
    Ok(records)
}
