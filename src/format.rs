//! File format sniffing.
//!
//! Only the leading magic bytes are inspected. Anything that cannot be read
//! is treated as "not this format".

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Reads up to `N` leading bytes, returning `None` for short or unreadable files.
fn read_magic<const N: usize>(path: &Path) -> Option<[u8; N]> {
    let mut file = File::open(path).ok()?;
    let mut buf = [0u8; N];
    file.read_exact(&mut buf).ok()?;
    Some(buf)
}

/// Returns true if the file is a RIFF container of form type `sfbk`.
pub fn is_soundfont<P: AsRef<Path>>(path: P) -> bool {
    match read_magic::<12>(path.as_ref()) {
        Some(header) => &header[0..4] == b"RIFF" && &header[8..12] == b"sfbk",
        None => false,
    }
}

/// Returns true if the file starts with a Standard MIDI File header chunk.
pub fn is_midifile<P: AsRef<Path>>(path: P) -> bool {
    matches!(read_magic::<4>(path.as_ref()), Some(header) if &header == b"MThd")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_soundfont_magic() {
        let sf = write_temp(b"RIFF\x10\x00\x00\x00sfbkLIST");
        assert!(is_soundfont(sf.path()));
        assert!(!is_midifile(sf.path()));

        let wav = write_temp(b"RIFF\x10\x00\x00\x00WAVEfmt ");
        assert!(!is_soundfont(wav.path()));
    }

    #[test]
    fn test_midi_magic() {
        let mid = write_temp(b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x01\xe0");
        assert!(is_midifile(mid.path()));
        assert!(!is_soundfont(mid.path()));
    }

    #[test]
    fn test_short_and_missing_files() {
        let short = write_temp(b"MT");
        assert!(!is_midifile(short.path()));
        assert!(!is_soundfont(short.path()));
        assert!(!is_midifile("/nonexistent/file.mid"));
        assert!(!is_soundfont("/nonexistent/file.sf2"));
    }
}
