//! Standard MIDI File (SMF) loading.
//!
//! Parses .mid files with `midly` into a single time-ordered list of channel
//! events. Format 0 and Format 1 files are supported; tracks of a Format 1
//! file are merged. Format 2 (sequential) files are rejected.
//!
//! Tempo meta events from any track build the tempo map. Sysex and other
//! meta events are ignored.

use super::{ChannelMessage, DEFAULT_USEC_PER_BEAT};
use crate::error::{Error, Result};
use midly::{Format, MetaMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::{Path, PathBuf};

/// A channel message at an absolute position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Absolute tick.
    pub tick: u32,
    /// Absolute time in seconds, tempo map applied.
    pub time: f64,
    pub message: ChannelMessage,
}

/// A tempo change with the absolute time at which it takes effect.
#[derive(Debug, Clone, Copy)]
struct TempoChange {
    tick: u32,
    time: f64,
    usec_per_beat: u32,
}

/// How ticks map to wall-clock time.
#[derive(Debug, Clone)]
enum Clock {
    /// Ticks per quarter note plus a tempo map (always starting at tick 0).
    Metrical {
        ticks_per_beat: u32,
        tempo_map: Vec<TempoChange>,
    },
    /// SMPTE timing: a fixed number of ticks per second.
    Timecode { ticks_per_second: f64 },
}

impl Clock {
    fn tick_to_seconds(&self, tick: u32) -> f64 {
        match self {
            Clock::Metrical {
                ticks_per_beat,
                tempo_map,
            } => {
                let change = tempo_map
                    .iter()
                    .rev()
                    .find(|c| c.tick <= tick)
                    .unwrap_or(&tempo_map[0]);
                let beats = (tick - change.tick) as f64 / *ticks_per_beat as f64;
                change.time + beats * change.usec_per_beat as f64 / 1_000_000.0
            }
            Clock::Timecode { ticks_per_second } => tick as f64 / ticks_per_second,
        }
    }

    fn seconds_to_tick(&self, seconds: f64) -> u32 {
        let seconds = seconds.max(0.0);
        match self {
            Clock::Metrical {
                ticks_per_beat,
                tempo_map,
            } => {
                let change = tempo_map
                    .iter()
                    .rev()
                    .find(|c| c.time <= seconds)
                    .unwrap_or(&tempo_map[0]);
                let beats = (seconds - change.time) * 1_000_000.0 / change.usec_per_beat as f64;
                change
                    .tick
                    .saturating_add((beats * *ticks_per_beat as f64) as u32)
            }
            Clock::Timecode { ticks_per_second } => (seconds * ticks_per_second) as u32,
        }
    }
}

/// A parsed MIDI file ready for playback.
#[derive(Debug, Clone)]
pub struct Sequence {
    path: PathBuf,
    clock: Clock,
    events: Vec<TimedEvent>,
    total_ticks: u32,
    duration: f64,
}

impl Sequence {
    /// Reads and parses a MIDI file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid SMF, or is
    /// a Format 2 file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        Self::parse(&data, path)
    }

    /// Parses SMF bytes. `path` is kept for display only.
    pub fn parse(data: &[u8], path: &Path) -> Result<Self> {
        let smf = Smf::parse(data).map_err(|e| Error::MidiParse(e.to_string()))?;

        if smf.header.format == Format::Sequential {
            return Err(Error::UnsupportedFormat(
                "Format 2 (sequential) MIDI files not supported".to_string(),
            ));
        }

        let mut raw_events: Vec<(u32, ChannelMessage)> = Vec::new();
        let mut tempos: Vec<(u32, u32)> = Vec::new();
        let mut total_ticks: u32 = 0;

        for track in &smf.tracks {
            let mut tick: u32 = 0;
            for event in track {
                tick = tick.saturating_add(event.delta.as_int());
                match event.kind {
                    TrackEventKind::Midi { channel, message } => {
                        let message = ChannelMessage::from_midly(channel.as_int(), message);
                        raw_events.push((tick, message));
                    }
                    TrackEventKind::Meta(MetaMessage::Tempo(usec)) => {
                        let usec = usec.as_int();
                        if usec > 0 {
                            tempos.push((tick, usec));
                        }
                    }
                    _ => {}
                }
            }
            total_ticks = total_ticks.max(tick);
        }

        // Stable: events at the same tick keep track order, then file order
        raw_events.sort_by_key(|(tick, _)| *tick);

        let clock = match smf.header.timing {
            Timing::Metrical(tpb) => {
                let ticks_per_beat = tpb.as_int() as u32;
                if ticks_per_beat == 0 {
                    return Err(Error::MidiParse("division of zero ticks per beat".to_string()));
                }
                Clock::Metrical {
                    ticks_per_beat,
                    tempo_map: build_tempo_map(tempos, ticks_per_beat),
                }
            }
            Timing::Timecode(fps, subframes) => {
                let ticks_per_second = fps.as_f32() as f64 * subframes as f64;
                if ticks_per_second <= 0.0 {
                    return Err(Error::MidiParse("SMPTE division of zero".to_string()));
                }
                Clock::Timecode { ticks_per_second }
            }
        };

        let events = raw_events
            .into_iter()
            .map(|(tick, message)| TimedEvent {
                tick,
                time: clock.tick_to_seconds(tick),
                message,
            })
            .collect();

        let duration = clock.tick_to_seconds(total_ticks);

        Ok(Self {
            path: path.to_path_buf(),
            clock,
            events,
            total_ticks,
            duration,
        })
    }

    /// The file this sequence was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All channel events in playback order.
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Tick of the last event in the longest track (end of track included).
    pub fn total_ticks(&self) -> u32 {
        self.total_ticks
    }

    /// Playback length in seconds at normal speed.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn tick_to_seconds(&self, tick: u32) -> f64 {
        self.clock.tick_to_seconds(tick)
    }

    pub fn seconds_to_tick(&self, seconds: f64) -> u32 {
        self.clock.seconds_to_tick(seconds)
    }
}

/// Builds the tempo map from (tick, usec per beat) pairs in file order.
/// A later change at the same tick wins.
fn build_tempo_map(mut tempos: Vec<(u32, u32)>, ticks_per_beat: u32) -> Vec<TempoChange> {
    tempos.sort_by_key(|(tick, _)| *tick);

    let mut map = vec![TempoChange {
        tick: 0,
        time: 0.0,
        usec_per_beat: DEFAULT_USEC_PER_BEAT,
    }];

    for (tick, usec_per_beat) in tempos {
        let last = map[map.len() - 1];
        if last.tick == tick {
            let idx = map.len() - 1;
            map[idx].usec_per_beat = usec_per_beat;
            continue;
        }
        let beats = (tick - last.tick) as f64 / ticks_per_beat as f64;
        map.push(TempoChange {
            tick,
            time: last.time + beats * last.usec_per_beat as f64 / 1_000_000.0,
            usec_per_beat,
        });
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fixture::{single_note, smf_bytes, TrackBuilder};
    use crate::midi::{NOTE_OFF, NOTE_ON, PROGRAM_CHANGE};

    fn parse(bytes: &[u8]) -> Result<Sequence> {
        Sequence::parse(bytes, Path::new("test.mid"))
    }

    #[test]
    fn test_single_note_timing() {
        let seq = parse(&single_note(480)).unwrap();
        assert_eq!(seq.total_ticks(), 480);
        // 120 BPM default: one beat is half a second
        assert!((seq.duration() - 0.5).abs() < 1e-9);

        let commands: Vec<u8> = seq.events().iter().map(|e| e.message.command).collect();
        assert_eq!(commands, vec![PROGRAM_CHANGE, NOTE_ON, NOTE_OFF]);
        assert!((seq.events()[2].time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tempo_change_applies_after_its_tick() {
        // One beat at 120 BPM, then one beat at 60 BPM
        let conductor = TrackBuilder::new().tempo(480, 1_000_000);
        let notes = TrackBuilder::new()
            .note_on(0, 0, 60, 100)
            .note_off(960, 0, 60);
        let seq = parse(&smf_bytes(1, 480, vec![(conductor, 0), (notes, 0)])).unwrap();

        assert_eq!(seq.total_ticks(), 960);
        assert!((seq.tick_to_seconds(480) - 0.5).abs() < 1e-9);
        assert!((seq.duration() - 1.5).abs() < 1e-9);
        assert_eq!(seq.seconds_to_tick(1.0), 720);
    }

    #[test]
    fn test_seconds_to_tick_saturates_past_last_tempo_change() {
        let conductor = TrackBuilder::new().tempo(480, 1_000_000);
        let notes = TrackBuilder::new().note_on(0, 0, 60, 100).note_off(960, 0, 60);
        let seq = parse(&smf_bytes(1, 480, vec![(conductor, 0), (notes, 0)])).unwrap();

        assert_eq!(seq.seconds_to_tick(1e12), u32::MAX);
        assert_eq!(seq.seconds_to_tick(f64::MAX), u32::MAX);
    }

    #[test]
    fn test_tracks_merge_in_time_order() {
        let first = TrackBuilder::new().note_on(100, 0, 60, 100).note_off(100, 0, 60);
        let second = TrackBuilder::new().note_on(50, 1, 64, 100).note_off(200, 1, 64);
        let seq = parse(&smf_bytes(1, 480, vec![(first, 0), (second, 0)])).unwrap();

        let ticks: Vec<u32> = seq.events().iter().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![50, 100, 200, 250]);
        assert_eq!(seq.events()[0].message.channel, 1);
    }

    #[test]
    fn test_total_ticks_includes_trailing_silence() {
        let track = TrackBuilder::new().note_on(0, 0, 60, 100).note_off(240, 0, 60);
        let seq = parse(&smf_bytes(0, 480, vec![(track, 720)])).unwrap();
        assert_eq!(seq.total_ticks(), 960);
    }

    #[test]
    fn test_sequential_format_rejected() {
        let track = TrackBuilder::new().note_on(0, 0, 60, 100);
        let err = parse(&smf_bytes(2, 480, vec![(track, 10)])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(parse(b"MThd garbage"), Err(Error::MidiParse(_))));
    }
}
