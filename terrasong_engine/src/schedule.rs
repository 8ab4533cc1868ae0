// The event scheduler: orchestrates one full generation run.
//
// Walks the ordered feature records exactly once, one fixed-length step per
// record, and drives every lane from each record in a fixed order: drums,
// crash accent, lead voice, bass voice, pad. Emitted events land on a
// monotonic beat clock that advances by one step per record.
//
// All tunables live in `EngineConfig`: channel bindings, per-voice gates and
// registers, duty-cycle strides, rest probabilities, and the accent trigger.
// The accent's default binding carries a quirk worth knowing: it listens to
// the hi-hat rhythm channel, which upstream is fed by the water-coverage
// signal. The binding is configuration, not a constant, so either reading of
// the data can be wired without touching the engine.
//
// Failure is not a concept here. A missing channel mutes its own lane for
// that step and nothing else; the run always completes.
//
// **Critical constraint: determinism.** Records must be processed in
// increasing step order — the drum sequencer's bar/phrase counters and each
// voice's history are accumulated state. All randomness (boredom jumps,
// repeat nudges, humanization) comes from the single rng threaded through
// the run, so one seed and one input sequence yield one event stream.
//
// See also: `melody.rs`, `drums.rs`, `dynamics.rs` for the per-lane logic.

use crate::drums::{CRASH_KEY, DrumSequencer, HitKind};
use crate::dynamics::{humanize, lane_velocity, melody_velocity};
use crate::event::{Event, Performance, Track};
use crate::feature::{FeatureRecord, MelodyChannel, RhythmChannel};
use crate::melody::MelodyVoice;
use crate::scale::Register;
use rand::Rng;

/// Kick velocity follows the kick channel's volume.
const KICK_BASE: f64 = 80.0;
const KICK_SCALE: f64 = 40.0;
/// Snare velocity follows the snare channel's volume, gentler slope.
const SNARE_BASE: f64 = 90.0;
const SNARE_SCALE: f64 = 30.0;
/// Hats ride at fixed loudness; humanization supplies the variation.
const CLOSED_HAT_VELOCITY: u8 = 60;
const OPEN_HAT_VELOCITY: u8 = 85;

/// Per-voice scheduling configuration.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Which melodic channel feeds this voice.
    pub channel: MelodyChannel,
    /// Register the voice draws pitches from.
    pub register: Register,
    /// The channel volume must exceed this for the voice to sound.
    pub gate: f64,
    /// The voice is eligible only on steps where `step % stride == 0`.
    /// 1 means every step.
    pub stride: u32,
    /// Probability of resting instead of sounding when a boredom jump fired
    /// — a deliberate breath so corrections don't sound mechanical.
    pub rest_probability: f64,
    /// Raise the velocity base on boredom jumps so the leap is audible.
    pub boost_on_jump: bool,
    /// Note length in steps.
    pub duration_steps: f64,
}

/// Pad lane configuration. The pad is driven by volume alone: no pitch
/// logic, one sustained note per step while the channel is audible.
#[derive(Debug, Clone)]
pub struct PadConfig {
    pub channel: MelodyChannel,
    pub gate: f64,
    pub pitch: u8,
    pub duration_steps: f64,
    pub velocity_base: f64,
    pub velocity_scale: f64,
}

/// Crash accent configuration.
#[derive(Debug, Clone)]
pub struct AccentConfig {
    /// Rhythm channel whose level requests the accent.
    pub channel: RhythmChannel,
    /// Level the channel must exceed to request a crash.
    pub threshold: f64,
    /// Fixed crash velocity; accents are not humanized.
    pub velocity: u8,
}

/// Complete engine configuration. Build one with struct update syntax off
/// `Default` to override individual fields.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tempo_bpm: u16,
    /// Step length in quarter-note beats.
    pub step_duration: f64,
    pub lead: VoiceConfig,
    pub bass: VoiceConfig,
    pub pad: PadConfig,
    pub accent: AccentConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tempo_bpm: 112,
            step_duration: 0.25,
            lead: VoiceConfig {
                channel: MelodyChannel::Ndvi,
                register: Register::Mid,
                gate: 0.0,
                stride: 1,
                rest_probability: 0.2,
                boost_on_jump: true,
                duration_steps: 1.0,
            },
            bass: VoiceConfig {
                channel: MelodyChannel::Ndbi,
                register: Register::Low,
                gate: 0.0,
                stride: 2,
                rest_probability: 0.0,
                boost_on_jump: false,
                duration_steps: 2.0,
            },
            pad: PadConfig {
                channel: MelodyChannel::Ndwi,
                gate: 0.0,
                pitch: 60,
                duration_steps: 4.0,
                velocity_base: 50.0,
                velocity_scale: 30.0,
            },
            accent: AccentConfig {
                channel: RhythmChannel::Hihat,
                threshold: 0.4,
                velocity: 110,
            },
        }
    }
}

/// The orchestrator. Owns all per-run state; one instance per run.
#[derive(Debug)]
pub struct EventScheduler {
    config: EngineConfig,
    lead: MelodyVoice,
    bass: MelodyVoice,
    drums: DrumSequencer,
    clock: f64,
    events: Vec<Event>,
}

impl EventScheduler {
    pub fn new(config: EngineConfig) -> Self {
        EventScheduler {
            config,
            lead: MelodyVoice::new(),
            bass: MelodyVoice::new(),
            drums: DrumSequencer::new(),
            clock: 0.0,
            events: Vec::new(),
        }
    }

    /// Process the whole input sequence and produce the performance.
    ///
    /// Consumes the scheduler: per-run state never leaks into a second run.
    pub fn run(mut self, records: &[FeatureRecord], rng: &mut impl Rng) -> Performance {
        for record in records {
            self.process_record(record, rng);
        }
        Performance {
            tempo_bpm: self.config.tempo_bpm,
            events: self.events,
        }
    }

    fn process_record(&mut self, record: &FeatureRecord, rng: &mut impl Rng) {
        let start = self.clock;
        let step_duration = self.config.step_duration;

        // Drums first: the sequencer's cooldown decrement must land before
        // any accent request for this step.
        let intensity = record.rhythm.intensity();
        let hits = self.drums.next_hits(record.step_index, intensity);
        for &hit in hits {
            let velocity = match hit {
                HitKind::Kick => lane_velocity(KICK_BASE, KICK_SCALE, record.rhythm.kick),
                HitKind::Snare => lane_velocity(SNARE_BASE, SNARE_SCALE, record.rhythm.snare),
                HitKind::ClosedHat => CLOSED_HAT_VELOCITY,
                HitKind::OpenHat => OPEN_HAT_VELOCITY,
            };
            self.events.push(Event::DrumHit {
                track: Track::Drums,
                key: hit.gm_key(),
                start_time: start,
                duration: step_duration,
                velocity: humanize(velocity, rng),
            });
        }

        // Crash accent, gated by the sequencer's cooldown.
        if record.rhythm.get(self.config.accent.channel) > self.config.accent.threshold
            && self.drums.try_trigger_accent()
        {
            self.events.push(Event::DrumHit {
                track: Track::Drums,
                key: CRASH_KEY,
                start_time: start,
                duration: step_duration,
                velocity: self.config.accent.velocity,
            });
        }

        // Melodic voices.
        if let Some(event) = Self::melody_note(
            &mut self.lead,
            &self.config.lead,
            Track::Lead,
            record,
            start,
            step_duration,
            rng,
        ) {
            self.events.push(event);
        }
        if let Some(event) = Self::melody_note(
            &mut self.bass,
            &self.config.bass,
            Track::Bass,
            record,
            start,
            step_duration,
            rng,
        ) {
            self.events.push(event);
        }

        // Pad: sustained while its channel is audible.
        let pad = &self.config.pad;
        if let Some(sample) = record.melody.get(pad.channel) {
            if sample.volume > pad.gate {
                let velocity = lane_velocity(pad.velocity_base, pad.velocity_scale, sample.volume);
                self.events.push(Event::Note {
                    track: Track::Pad,
                    channel: Track::Pad.channel(),
                    pitch: pad.pitch,
                    start_time: start,
                    duration: pad.duration_steps * step_duration,
                    velocity: humanize(velocity, rng),
                });
            }
        }

        self.clock += step_duration;
    }

    /// One voice's contribution for this step, if the record admits one.
    ///
    /// The voice state advances whenever the gate and duty cycle admit the
    /// step, even if the note is then suppressed as a boredom rest.
    fn melody_note(
        voice: &mut MelodyVoice,
        cfg: &VoiceConfig,
        track: Track,
        record: &FeatureRecord,
        start_time: f64,
        step_duration: f64,
        rng: &mut impl Rng,
    ) -> Option<Event> {
        let sample = record.melody.get(cfg.channel)?;
        if sample.volume <= cfg.gate || record.step_index % cfg.stride.max(1) != 0 {
            return None;
        }

        let (pitch, was_boring) = voice.next_pitch(sample.zscore, cfg.register, rng);
        let rest_probability = cfg.rest_probability.clamp(0.0, 1.0);
        if was_boring && rest_probability > 0.0 && rng.random_bool(rest_probability) {
            return None;
        }

        let velocity = melody_velocity(sample.volume, was_boring && cfg.boost_on_jump);
        Some(Event::Note {
            track,
            channel: track.channel(),
            pitch,
            start_time,
            duration: cfg.duration_steps * step_duration,
            velocity: humanize(velocity, rng),
        })
    }
}

/// Generate a performance from an ordered feature sequence.
///
/// Convenience wrapper: builds a fresh scheduler around `config` and runs
/// it over `records` with the given rng.
pub fn generate_performance(
    records: &[FeatureRecord],
    config: &EngineConfig,
    rng: &mut impl Rng,
) -> Performance {
    EventScheduler::new(config.clone()).run(records, rng)
}
