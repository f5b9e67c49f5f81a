//! rodio source that renders from the shared engine.

use super::BLOCK_FRAMES;
use crate::engine::Shared;
use rodio::Source;
use std::sync::Arc;
use std::time::Duration;

/// Audio source that generates samples from the engine.
/// Implements rodio's Source trait for playback.
pub(crate) struct EngineSource {
    shared: Arc<Shared>,
    /// Left channel buffer.
    left_buf: Vec<f32>,
    /// Right channel buffer.
    right_buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl EngineSource {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            left_buf: vec![0.0; BLOCK_FRAMES],
            right_buf: vec![0.0; BLOCK_FRAMES],
            buf_pos: BLOCK_FRAMES, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for EngineSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BLOCK_FRAMES {
            // Renders silence while nothing plays, so the stream never ends
            self.shared.render(&mut self.left_buf, &mut self.right_buf);
            self.buf_pos = 0;
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for EngineSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2 // Stereo
    }

    fn sample_rate(&self) -> u32 {
        self.shared.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None // Infinite stream
    }
}
