//! Hand-built Standard MIDI Files for tests.

use std::io::Write;
use std::path::Path;

/// Writes a variable-length quantity: 7 bits per byte, MSB set on all but the last.
fn write_vlq(value: u32, buffer: &mut Vec<u8>) {
    let mut bytes = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        bytes.push(((rest & 0x7F) as u8) | 0x80);
        rest >>= 7;
    }
    buffer.extend(bytes.iter().rev());
}

/// One track of (delta ticks, raw event bytes) pairs. End of track is appended.
pub(crate) struct TrackBuilder {
    data: Vec<u8>,
}

impl TrackBuilder {
    pub(crate) fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub(crate) fn event(mut self, delta: u32, bytes: &[u8]) -> Self {
        write_vlq(delta, &mut self.data);
        self.data.extend_from_slice(bytes);
        self
    }

    pub(crate) fn tempo(self, delta: u32, usec_per_beat: u32) -> Self {
        let t = usec_per_beat.to_be_bytes();
        self.event(delta, &[0xFF, 0x51, 0x03, t[1], t[2], t[3]])
    }

    pub(crate) fn note_on(self, delta: u32, channel: u8, key: u8, vel: u8) -> Self {
        self.event(delta, &[0x90 | channel, key, vel])
    }

    pub(crate) fn note_off(self, delta: u32, channel: u8, key: u8) -> Self {
        self.event(delta, &[0x80 | channel, key, 0])
    }

    pub(crate) fn program(self, delta: u32, channel: u8, program: u8) -> Self {
        self.event(delta, &[0xC0 | channel, program])
    }

    fn finish(mut self, delta: u32) -> Vec<u8> {
        write_vlq(delta, &mut self.data);
        self.data.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        let mut chunk = b"MTrk".to_vec();
        chunk.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        chunk.extend_from_slice(&self.data);
        chunk
    }
}

/// Assembles a file with the given format and ticks per quarter note.
/// Each track is paired with the delta of its end-of-track event.
pub(crate) fn smf_bytes(
    format: u16,
    ticks_per_beat: u16,
    tracks: Vec<(TrackBuilder, u32)>,
) -> Vec<u8> {
    let mut out = b"MThd".to_vec();
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&ticks_per_beat.to_be_bytes());
    for (track, end_delta) in tracks {
        out.extend(track.finish(end_delta));
    }
    out
}

/// A single-track file: one note of `length_ticks` at 120 BPM, 480 ticks per beat.
pub(crate) fn single_note(length_ticks: u32) -> Vec<u8> {
    let track = TrackBuilder::new()
        .program(0, 0, 0)
        .note_on(0, 0, 60, 100)
        .note_off(length_ticks, 0, 60);
    smf_bytes(0, 480, vec![(track, 0)])
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}

#[test]
fn test_vlq_encoding() {
    let mut buf = Vec::new();
    write_vlq(0, &mut buf);
    assert_eq!(buf, vec![0x00]);

    buf.clear();
    write_vlq(0x7F, &mut buf);
    assert_eq!(buf, vec![0x7F]);

    buf.clear();
    write_vlq(0x80, &mut buf);
    assert_eq!(buf, vec![0x81, 0x00]);

    buf.clear();
    write_vlq(0x0FFF_FFFF, &mut buf);
    assert_eq!(buf, vec![0xFF, 0xFF, 0xFF, 0x7F]);
}
