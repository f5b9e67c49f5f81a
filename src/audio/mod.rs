//! Audio output for the synthesizer.
//!
//! The driver runs on its own thread and pulls rendered blocks from the
//! shared engine. Backends:
//! - system output via rodio
//! - a null sink paced in real time
//! - a WAV file writer via hound

pub mod driver;
mod source;

pub use driver::AudioDriver;

/// Frames rendered per block.
/// Smaller = lower latency but higher CPU usage.
pub const BLOCK_FRAMES: usize = 256;
