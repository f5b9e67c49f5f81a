//! midijuke - SoundFont MIDI playback with a small control surface.
//!
//! This library initializes a synthesizer/player pair, loads SoundFonts,
//! queues MIDI files and exposes play/pause/stop/wait, from Rust through
//! [`Session`] and from C through the [`ffi`] functions. The [`jukebox`]
//! module drives a session from a MIDI library and text commands.

pub mod audio;
pub mod config;
mod engine;
pub mod error;
pub mod ffi;
pub mod format;
pub mod jukebox;
pub mod midi;
pub mod player;
pub mod session;
pub mod settings;
pub mod synth;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use player::PlayerStatus;
pub use session::{Session, Waiter};
pub use settings::{AudioBackend, Settings};
pub use synth::FontId;
