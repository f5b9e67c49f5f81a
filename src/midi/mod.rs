//! MIDI data handed from the player to the synthesizer.
//!
//! Files are parsed by `midly` into a [`Sequence`]; the player then feeds
//! [`ChannelMessage`]s to anything implementing [`MidiSink`].

#[cfg(test)]
pub(crate) mod fixture;
mod sequence;

pub use sequence::{Sequence, TimedEvent};

/// Default tempo in microseconds per quarter note (120 BPM).
pub const DEFAULT_USEC_PER_BEAT: u32 = 500_000;

/// Status nibble for note off.
pub const NOTE_OFF: u8 = 0x80;
/// Status nibble for note on.
pub const NOTE_ON: u8 = 0x90;
/// Status nibble for polyphonic aftertouch.
pub const KEY_PRESSURE: u8 = 0xA0;
/// Status nibble for control change.
pub const CONTROL_CHANGE: u8 = 0xB0;
/// Status nibble for program change.
pub const PROGRAM_CHANGE: u8 = 0xC0;
/// Status nibble for channel aftertouch.
pub const CHANNEL_PRESSURE: u8 = 0xD0;
/// Status nibble for pitch bend.
pub const PITCH_BEND: u8 = 0xE0;

/// A single channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    /// MIDI channel (0-15).
    pub channel: u8,
    /// Status nibble (0x80..=0xE0).
    pub command: u8,
    pub data1: u8,
    pub data2: u8,
}

impl ChannelMessage {
    /// Converts a parsed `midly` message on `channel`.
    pub fn from_midly(channel: u8, message: midly::MidiMessage) -> Self {
        use midly::MidiMessage;

        let (command, data1, data2) = match message {
            MidiMessage::NoteOff { key, vel } => (NOTE_OFF, key.as_int(), vel.as_int()),
            MidiMessage::NoteOn { key, vel } => (NOTE_ON, key.as_int(), vel.as_int()),
            MidiMessage::Aftertouch { key, vel } => (KEY_PRESSURE, key.as_int(), vel.as_int()),
            MidiMessage::Controller { controller, value } => {
                (CONTROL_CHANGE, controller.as_int(), value.as_int())
            }
            MidiMessage::ProgramChange { program } => (PROGRAM_CHANGE, program.as_int(), 0),
            MidiMessage::ChannelAftertouch { vel } => (CHANNEL_PRESSURE, vel.as_int(), 0),
            MidiMessage::PitchBend { bend } => {
                // 14-bit value, LSB first on the wire
                let value = bend.0.as_int();
                (PITCH_BEND, (value & 0x7F) as u8, (value >> 7) as u8)
            }
        };

        Self {
            channel,
            command,
            data1,
            data2,
        }
    }

    /// True for note on/off messages (a note on with velocity 0 counts).
    pub fn is_note(&self) -> bool {
        self.command == NOTE_ON || self.command == NOTE_OFF
    }
}

/// Receiver of channel messages during playback.
///
/// Implemented by the synthesizer; tests substitute a recorder.
pub trait MidiSink {
    /// Handles one channel voice message.
    fn process(&mut self, message: ChannelMessage);

    /// Releases every sounding note. With `immediate`, skips the release phase.
    fn all_notes_off(&mut self, immediate: bool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u14, u4, u7};
    use midly::PitchBend;

    #[test]
    fn test_pitch_bend_split() {
        let msg = ChannelMessage::from_midly(
            3,
            midly::MidiMessage::PitchBend {
                bend: PitchBend(u14::new(0x2001)),
            },
        );
        assert_eq!(msg.command, PITCH_BEND);
        assert_eq!(msg.data1, 0x01);
        assert_eq!(msg.data2, 0x40);
        assert_eq!(msg.channel, 3);
    }

    #[test]
    fn test_note_detection() {
        let on = ChannelMessage::from_midly(
            0,
            midly::MidiMessage::NoteOn {
                key: u7::new(60),
                vel: u7::new(0),
            },
        );
        assert!(on.is_note());

        let program = ChannelMessage::from_midly(
            u4::new(9).as_int(),
            midly::MidiMessage::ProgramChange {
                program: u7::new(5),
            },
        );
        assert!(!program.is_note());
        assert_eq!(program.data1, 5);
    }
}
