//! Audio driver lifecycle.
//!
//! Every backend runs on a dedicated thread that owns its output and stops
//! when the driver is shut down. The rodio stream is not `Send`, so keeping
//! it on that thread is what lets a session move between threads.

use super::source::EngineSource;
use super::BLOCK_FRAMES;
use crate::engine::Shared;
use crate::error::{Error, Result};
use crate::settings::{AudioBackend, Settings};
use hound::{SampleFormat, WavSpec, WavWriter};
use rodio::OutputStream;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A running audio backend.
pub struct AudioDriver {
    backend: AudioBackend,
    /// Dropping the sender tells the thread to exit.
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioDriver {
    /// Starts the configured backend and waits until it is producing audio.
    ///
    /// # Errors
    ///
    /// Returns error if the output device or file cannot be opened.
    pub(crate) fn start(settings: &Settings, shared: Arc<Shared>) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        let backend = settings.driver.clone();
        let output_file = settings.output_file.clone();
        let thread = thread::Builder::new()
            .name(format!("midijuke-audio-{}", backend))
            .spawn({
                let backend = backend.clone();
                move || match backend {
                    AudioBackend::System(_) => run_system(shared, shutdown_rx, ready_tx),
                    AudioBackend::Null => run_null(shared, shutdown_rx, ready_tx),
                    AudioBackend::File => run_file(shared, output_file, shutdown_rx, ready_tx),
                }
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                tracing::info!("Audio driver '{}' started", backend);
                Ok(Self {
                    backend,
                    shutdown: Some(shutdown_tx),
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(Error::AudioOutput(format!(
                    "audio driver '{}' exited during startup",
                    backend
                )))
            }
        }
    }

    /// Stops the backend thread and waits for it. Safe to call twice.
    pub fn shutdown(&mut self) {
        drop(self.shutdown.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Audio driver '{}' thread panicked", self.backend);
            } else {
                tracing::debug!("Audio driver '{}' stopped", self.backend);
            }
        }
    }
}

impl Drop for AudioDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn block_duration(sample_rate: u32) -> Duration {
    Duration::from_secs_f64(BLOCK_FRAMES as f64 / sample_rate as f64)
}

/// Plays through the default output device until shut down.
fn run_system(shared: Arc<Shared>, shutdown: Receiver<()>, ready: SyncSender<Result<()>>) {
    let (stream, stream_handle) = match OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = ready.send(Err(Error::AudioOutput(format!(
                "Failed to open audio output: {}",
                e
            ))));
            return;
        }
    };

    if let Err(e) = stream_handle.play_raw(EngineSource::new(shared)) {
        let _ = ready.send(Err(Error::AudioOutput(format!(
            "Failed to start audio playback: {}",
            e
        ))));
        return;
    }
    let _ = ready.send(Ok(()));

    // Only ever returns Err, once the sender is dropped
    let _ = shutdown.recv();
    drop(stream_handle);
    drop(stream);
}

/// Renders in real time and throws the audio away.
fn run_null(shared: Arc<Shared>, shutdown: Receiver<()>, ready: SyncSender<Result<()>>) {
    let block = block_duration(shared.sample_rate());
    let mut left = vec![0.0f32; BLOCK_FRAMES];
    let mut right = vec![0.0f32; BLOCK_FRAMES];
    let _ = ready.send(Ok(()));

    let mut deadline = Instant::now();
    loop {
        shared.render(&mut left, &mut right);
        deadline += block;
        let pause = deadline.saturating_duration_since(Instant::now());
        match shutdown.recv_timeout(pause) {
            Err(RecvTimeoutError::Timeout) => continue,
            _ => break,
        }
    }
}

/// Renders as fast as possible while playing and writes 16-bit stereo WAV.
fn run_file(
    shared: Arc<Shared>,
    path: PathBuf,
    shutdown: Receiver<()>,
    ready: SyncSender<Result<()>>,
) {
    let spec = WavSpec {
        channels: 2,
        sample_rate: shared.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = match WavWriter::create(&path, spec) {
        Ok(writer) => writer,
        Err(e) => {
            let _ = ready.send(Err(Error::AudioOutput(format!(
                "Failed to create output WAV file {}: {}",
                path.display(),
                e
            ))));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    let block = block_duration(shared.sample_rate());
    let mut left = vec![0.0f32; BLOCK_FRAMES];
    let mut right = vec![0.0f32; BLOCK_FRAMES];

    'render: loop {
        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => break,
        }

        if !shared.is_playing() {
            match shutdown.recv_timeout(block) {
                Err(RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        }

        shared.render(&mut left, &mut right);
        for (l, r) in left.iter().zip(right.iter()) {
            // Convert f32 (-1.0 to 1.0) to i16
            let l = (l * 32767.0).clamp(-32768.0, 32767.0) as i16;
            let r = (r * 32767.0).clamp(-32768.0, 32767.0) as i16;
            if let Err(e) = writer.write_sample(l).and_then(|_| writer.write_sample(r)) {
                tracing::error!("Writing {} failed: {}", path.display(), e);
                break 'render;
            }
        }
    }

    match writer.finalize() {
        Ok(()) => tracing::info!("Wrote {}", path.display()),
        Err(e) => tracing::error!("Failed to finalize WAV file {}: {}", path.display(), e),
    }
}
