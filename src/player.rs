//! MIDI playlist playback.
//!
//! The player owns a playlist of parsed sequences and a transport position.
//! It is driven block by block from the audio thread via [`Player::advance`],
//! which dispatches due events into a [`MidiSink`].

use crate::error::{Error, Result};
use crate::midi::{MidiSink, Sequence};
use std::path::Path;

/// Represents the current playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Files attached, playback never started.
    Ready,
    /// Currently playing.
    Playing,
    /// Paused at current position.
    Paused,
    /// Stopped, position reset to start.
    Stopped,
    /// Reached the end of the playlist.
    Done,
}

impl PlayerStatus {
    /// True once playback has ended by itself or by `stop`.
    pub fn is_finished(self) -> bool {
        matches!(self, PlayerStatus::Stopped | PlayerStatus::Done)
    }
}

/// A playlist with transport state.
#[derive(Debug)]
pub struct Player {
    playlist: Vec<Sequence>,
    /// Index into the playlist.
    current: usize,
    /// Seconds into the current sequence.
    position: f64,
    /// Index of the first event not yet dispatched.
    next_event: usize,
    status: PlayerStatus,
    speed: f64,
    loops: i32,
    loops_remaining: i32,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Creates a player with an empty playlist that plays through once.
    pub fn new() -> Self {
        Self {
            playlist: Vec::new(),
            current: 0,
            position: 0.0,
            next_event: 0,
            status: PlayerStatus::Ready,
            speed: 1.0,
            loops: 1,
            loops_remaining: 1,
        }
    }

    /// Appends a sequence to the playlist.
    pub fn add(&mut self, sequence: Sequence) {
        self.playlist.push(sequence);
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// A busy player must not be replaced.
    pub fn is_busy(&self) -> bool {
        self.status == PlayerStatus::Playing
    }

    pub fn len(&self) -> usize {
        self.playlist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }

    /// Path of the sequence under the play head.
    pub fn current_file(&self) -> Option<&Path> {
        self.playlist.get(self.current).map(Sequence::path)
    }

    /// Sets how many times the playlist plays; negative loops forever.
    pub fn set_loop(&mut self, loops: i32) -> Result<()> {
        if loops == 0 {
            return Err(Error::InvalidSetting("loop count of zero".to_string()));
        }
        self.loops = loops;
        self.loops_remaining = loops;
        Ok(())
    }

    /// Sets the playback speed multiplier (1.0 is the file's own tempo).
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::InvalidSetting(format!("speed {}", speed)));
        }
        self.speed = speed;
        Ok(())
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Starts or resumes playback.
    ///
    /// Resumes from `Ready`/`Paused`; restarts from the top after
    /// `Stopped`/`Done`. An empty playlist finishes immediately.
    pub fn play(&mut self) {
        match self.status {
            PlayerStatus::Playing => return,
            PlayerStatus::Ready | PlayerStatus::Paused => {}
            PlayerStatus::Stopped | PlayerStatus::Done => self.rewind(),
        }
        self.status = if self.playlist.is_empty() {
            PlayerStatus::Done
        } else {
            PlayerStatus::Playing
        };
    }

    /// Pauses at the current position, letting notes release naturally.
    pub fn pause(&mut self, sink: &mut dyn MidiSink) {
        if self.status == PlayerStatus::Playing {
            sink.all_notes_off(false);
            self.status = PlayerStatus::Paused;
        }
    }

    /// Stops playback and resets position.
    pub fn stop(&mut self, sink: &mut dyn MidiSink) {
        sink.all_notes_off(true);
        self.rewind();
        self.status = PlayerStatus::Stopped;
    }

    /// Silences anything this player left sounding; used before it is dropped.
    pub fn release(&mut self, sink: &mut dyn MidiSink) {
        if self.status == PlayerStatus::Playing || self.status == PlayerStatus::Paused {
            sink.all_notes_off(true);
        }
    }

    /// Tick position within the current sequence.
    pub fn current_tick(&self) -> u32 {
        match self.playlist.get(self.current) {
            Some(seq) => seq.seconds_to_tick(self.position).min(seq.total_ticks()),
            None => 0,
        }
    }

    /// Length of the current sequence in ticks.
    pub fn total_ticks(&self) -> u32 {
        self.playlist
            .get(self.current)
            .map(Sequence::total_ticks)
            .unwrap_or(0)
    }

    /// Moves the play head to `tick` in the current sequence.
    ///
    /// Program and controller changes before the target are re-sent so the
    /// channels sound as they would had playback reached it normally. A
    /// finished player becomes `Paused` at the target, so the next `play`
    /// resumes there instead of restarting.
    pub fn seek(&mut self, tick: u32, sink: &mut dyn MidiSink) {
        let Some(seq) = self.playlist.get(self.current) else {
            return;
        };
        if self.status.is_finished() {
            self.loops_remaining = self.loops;
            self.status = PlayerStatus::Paused;
        }
        let tick = tick.min(seq.total_ticks());

        sink.all_notes_off(true);
        let events = seq.events();
        let target = events.partition_point(|e| e.tick < tick);
        for event in &events[..target] {
            if !event.message.is_note() {
                sink.process(event.message);
            }
        }

        self.next_event = target;
        self.position = seq.tick_to_seconds(tick);
    }

    /// Dispatches events due at the current position, then advances it by
    /// one block of `frames` samples.
    pub fn advance(&mut self, frames: usize, sample_rate: u32, sink: &mut dyn MidiSink) {
        if self.status != PlayerStatus::Playing {
            return;
        }

        // Entries crossed in this block; bounds the loop for empty files
        let mut hops = 0;
        loop {
            let Some(seq) = self.playlist.get(self.current) else {
                self.status = PlayerStatus::Done;
                return;
            };

            let events = seq.events();
            while self.next_event < events.len() && events[self.next_event].time <= self.position {
                sink.process(events[self.next_event].message);
                self.next_event += 1;
            }

            let finished = self.next_event >= events.len() && self.position >= seq.duration();
            if !finished {
                break;
            }
            if !self.next_entry(sink) {
                return;
            }
            hops += 1;
            if hops > self.playlist.len() {
                break;
            }
        }

        self.position += frames as f64 / sample_rate as f64 * self.speed;
    }

    /// Moves to the next playlist entry, looping if loops remain.
    /// Returns false when the playlist is exhausted.
    fn next_entry(&mut self, sink: &mut dyn MidiSink) -> bool {
        sink.all_notes_off(false);
        self.current += 1;
        self.position = 0.0;
        self.next_event = 0;

        if self.current < self.playlist.len() {
            return true;
        }

        if self.loops_remaining < 0 || self.loops_remaining > 1 {
            if self.loops_remaining > 0 {
                self.loops_remaining -= 1;
            }
            self.current = 0;
            return true;
        }

        self.current = 0;
        self.status = PlayerStatus::Done;
        tracing::debug!("Playlist finished");
        false
    }

    fn rewind(&mut self) {
        self.current = 0;
        self.position = 0.0;
        self.next_event = 0;
        self.loops_remaining = self.loops;
    }
}
