//! Error types for midijuke.
//!
//! Every fallible operation on a [`Session`](crate::Session) reports one of
//! these variants. The C surface collapses them into return codes.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the player library.
#[derive(Error, Debug)]
pub enum Error {
    /// The file does not look like a SoundFont (RIFF `sfbk`).
    #[error("Not a SoundFont file: {}", .0.display())]
    NotSoundFont(PathBuf),

    /// The file does not look like a Standard MIDI File.
    #[error("Not a MIDI file: {}", .0.display())]
    NotMidiFile(PathBuf),

    /// A MIDI file was attached while the player was still playing.
    #[error("Player is busy")]
    PlayerBusy,

    /// The audio driver name is not one we know how to start.
    #[error("Unknown audio driver: {0}")]
    UnknownDriver(String),

    /// A setting is outside the range the synthesizer accepts.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// SoundFont parsing failed.
    #[error("Failed to load SoundFont {}: {message}", .path.display())]
    SoundFont { path: PathBuf, message: String },

    /// The synthesizer could not be created from the loaded SoundFont.
    #[error("Failed to create synthesizer: {0}")]
    Synthesizer(String),

    /// MIDI parsing failed.
    #[error("MIDI parse error: {0}")]
    MidiParse(String),

    /// The MIDI file parsed but uses a layout we do not play.
    #[error("Unsupported MIDI format: {0}")]
    UnsupportedFormat(String),

    /// Audio output device or writer errors.
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Configuration file loading errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors.
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the midijuke Error.
pub type Result<T> = std::result::Result<T, Error>;
