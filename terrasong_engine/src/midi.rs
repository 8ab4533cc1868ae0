// MIDI output from performances.
//
// Converts a Performance into a Standard MIDI File (SMF) for playback and
// downstream packaging. Each logical track maps to its own MIDI track;
// event times in quarter-note beats map to ticks at 480 per quarter.
//
// Scheduler events carry explicit durations, so each becomes a NoteOn /
// NoteOff pair. When a new attack arrives for a key that is still sounding
// on the same track (the pad emits one overlapping sustained note per
// step), the sounding note is closed at the new attack.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1
// (multi-track).

use crate::event::{Event, Performance, Track};
use midly::{
    Format, Header, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::HashMap;
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

fn beats_to_ticks(beats: f64) -> u32 {
    (beats * TICKS_PER_QUARTER as f64).round() as u32
}

/// Convert a Performance to MIDI and write to a file.
pub fn write_midi(performance: &Performance, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let smf = to_smf(performance);
    let mut buf = Vec::new();
    smf.write(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Convert a Performance to an in-memory SMF.
pub fn to_smf(performance: &Performance) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Vec<TrackEvent<'static>> = Vec::new();
    // The tempo meta field is 24 bits; 4 BPM is the slowest that fits.
    let bpm = (performance.tempo_bpm as u32).max(4);
    let tempo_microseconds = 60_000_000 / bpm;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    for track in Track::ALL {
        smf.tracks.push(render_track(performance, track));
    }

    smf
}

// A note's lifetime in ticks, after overlap resolution.
struct NoteSpan {
    on: u32,
    off: u32,
    key: u8,
    velocity: u8,
}

/// Render one logical track to a MIDI track.
fn render_track(performance: &Performance, track: Track) -> Vec<TrackEvent<'static>> {
    let channel = u4::new(track.channel());
    let mut events: Vec<TrackEvent<'static>> = Vec::new();

    // Track name
    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::TrackName(track.name().as_bytes())),
    });

    // Melodic tracks pick their instrument; channel 9 percussion has none.
    if let Some(program) = track.program() {
        events.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        });
    }

    // Performance events are already in chronological order; turn this
    // track's share into spans, closing a still-sounding note when a new
    // attack arrives on the same key.
    let mut spans: Vec<NoteSpan> = Vec::new();
    let mut sounding: HashMap<u8, usize> = HashMap::new();
    for event in performance.events.iter().filter(|e| e.track() == track) {
        let (key, start_time, duration, velocity) = match *event {
            Event::Note {
                pitch,
                start_time,
                duration,
                velocity,
                ..
            } => (pitch, start_time, duration, velocity),
            Event::DrumHit {
                key,
                start_time,
                duration,
                velocity,
                ..
            } => (key, start_time, duration, velocity),
        };
        let on = beats_to_ticks(start_time);
        let off = beats_to_ticks(start_time + duration);
        if let Some(&prev) = sounding.get(&key) {
            if spans[prev].off > on {
                spans[prev].off = on;
            }
        }
        sounding.insert(key, spans.len());
        spans.push(NoteSpan {
            on,
            off,
            key,
            velocity,
        });
    }

    // Flatten spans into on/off moments. Sorting puts offs before ons at
    // the same tick, so a closed note never swallows its successor.
    let mut moments: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(spans.len() * 2);
    for span in &spans {
        moments.push((span.on, true, span.key, span.velocity));
        moments.push((span.off, false, span.key, 0));
    }
    moments.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

    let mut last_tick: u32 = 0;
    for (tick, is_on, key, velocity) in moments {
        let delta = tick - last_tick;
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(velocity),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        events.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }

    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack),
    });

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(track: Track, pitch: u8, start_time: f64, duration: f64, velocity: u8) -> Event {
        Event::Note {
            track,
            channel: track.channel(),
            pitch,
            start_time,
            duration,
            velocity,
        }
    }

    fn hit(key: u8, start_time: f64, velocity: u8) -> Event {
        Event::DrumHit {
            track: Track::Drums,
            key,
            start_time,
            duration: 0.25,
            velocity,
        }
    }

    fn midi_messages(events: &[TrackEvent<'_>]) -> Vec<(u32, MidiMessage)> {
        let mut tick = 0;
        events
            .iter()
            .filter_map(|event| {
                tick += event.delta.as_int();
                match event.kind {
                    TrackEventKind::Midi { message, .. } => Some((tick, message)),
                    _ => None,
                }
            })
            .collect()
    }

    #[test]
    fn five_tracks_with_tempo_first() {
        let performance = Performance {
            tempo_bpm: 112,
            events: vec![note(Track::Lead, 60, 0.0, 0.25, 80)],
        };
        let smf = to_smf(&performance);
        assert_eq!(smf.tracks.len(), 5);
        assert_eq!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(535_714)))
        );
    }

    #[test]
    fn melodic_tracks_announce_name_and_program() {
        let performance = Performance {
            tempo_bpm: 112,
            events: Vec::new(),
        };
        let smf = to_smf(&performance);

        // Lead track: name, then piano program change on channel 0.
        assert_eq!(
            smf.tracks[1][0].kind,
            TrackEventKind::Meta(midly::MetaMessage::TrackName(b"Lead"))
        );
        assert_eq!(
            smf.tracks[1][1].kind,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::ProgramChange {
                    program: u7::new(0)
                },
            }
        );

        // Drum track: name, then straight to end of track.
        assert_eq!(
            smf.tracks[4][0].kind,
            TrackEventKind::Meta(midly::MetaMessage::TrackName(b"Drums"))
        );
        assert_eq!(
            smf.tracks[4][1].kind,
            TrackEventKind::Meta(midly::MetaMessage::EndOfTrack)
        );
    }

    #[test]
    fn notes_become_matched_on_off_pairs() {
        let performance = Performance {
            tempo_bpm: 112,
            events: vec![
                note(Track::Lead, 63, 0.0, 0.25, 90),
                note(Track::Lead, 65, 0.25, 0.25, 85),
                hit(36, 0.0, 80),
                hit(42, 0.25, 60),
            ],
        };
        let smf = to_smf(&performance);
        for track in &smf.tracks[1..] {
            let mut sounding = 0i32;
            for (_, message) in midi_messages(track) {
                match message {
                    MidiMessage::NoteOn { .. } => sounding += 1,
                    MidiMessage::NoteOff { .. } => {
                        sounding -= 1;
                        assert!(sounding >= 0, "NoteOff without a sounding note");
                    }
                    _ => {}
                }
            }
            assert_eq!(sounding, 0, "unterminated note");
        }
    }

    #[test]
    fn overlapping_same_key_notes_are_truncated() {
        // Two pad steps, one beat of sustain each: the second attack must
        // close the first note at tick 120 instead of letting it ring.
        let performance = Performance {
            tempo_bpm: 112,
            events: vec![
                note(Track::Pad, 60, 0.0, 1.0, 70),
                note(Track::Pad, 60, 0.25, 1.0, 70),
            ],
        };
        let smf = to_smf(&performance);
        let messages = midi_messages(&smf.tracks[3]);
        let shape: Vec<(u32, bool)> = messages
            .iter()
            .filter_map(|&(tick, message)| match message {
                MidiMessage::NoteOn { .. } => Some((tick, true)),
                MidiMessage::NoteOff { .. } => Some((tick, false)),
                _ => None,
            })
            .collect();
        assert_eq!(
            shape,
            vec![(0, true), (120, false), (120, true), (600, false)]
        );
    }

    #[test]
    fn drums_stay_on_channel_nine() {
        let performance = Performance {
            tempo_bpm: 112,
            events: vec![hit(36, 0.0, 80), hit(49, 0.0, 110), hit(38, 0.25, 95)],
        };
        let smf = to_smf(&performance);
        let mut seen = 0;
        for event in &smf.tracks[4] {
            if let TrackEventKind::Midi { channel, .. } = event.kind {
                assert_eq!(channel, u4::new(9));
                seen += 1;
            }
        }
        assert_eq!(seen, 6);
    }

    #[test]
    fn degenerate_tempo_stays_in_meta_range() {
        for tempo_bpm in [0u16, 1, 3] {
            let performance = Performance {
                tempo_bpm,
                events: Vec::new(),
            };
            let smf = to_smf(&performance);
            assert_eq!(
                smf.tracks[0][0].kind,
                TrackEventKind::Meta(midly::MetaMessage::Tempo(u24::new(15_000_000))),
                "tempo {tempo_bpm}"
            );
        }
    }

    #[test]
    fn empty_performance_still_renders() {
        let performance = Performance {
            tempo_bpm: 90,
            events: Vec::new(),
        };
        let smf = to_smf(&performance);
        assert_eq!(smf.tracks.len(), 5);
        let mut buf = Vec::new();
        smf.write(&mut buf).unwrap();
        assert!(!buf.is_empty());
    }
}
