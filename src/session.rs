//! The synthesizer/player lifecycle.
//!
//! ```text
//! init → load_soundfont → add_midi → play/pause/stop → wait → cleanup
//! ```
//!
//! A [`Session`] owns the settings, the synth, the current player and the
//! audio driver. The driver is started lazily by the first successful
//! [`Session::add_midi`].

use crate::audio::AudioDriver;
use crate::engine::{Engine, Shared};
use crate::error::{Error, Result};
use crate::format;
use crate::midi::Sequence;
use crate::player::{Player, PlayerStatus};
use crate::settings::Settings;
use crate::synth::{FontId, Synth};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A cloneable handle that can block on playback without borrowing the session.
#[derive(Clone)]
pub struct Waiter {
    shared: Arc<Shared>,
}

impl Waiter {
    /// Blocks while the player is playing.
    pub fn wait(&self) {
        self.shared.wait();
    }

    /// Returns true if playback ended before `timeout` elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared.wait_timeout(timeout)
    }
}

/// A synthesizer, its player and the audio driver feeding an output.
///
/// Teardown order is driver, player, synth, settings; [`Session::cleanup`]
/// and `Drop` both follow it.
pub struct Session {
    driver: Option<AudioDriver>,
    shared: Arc<Shared>,
    settings: Settings,
    closed: bool,
}

impl Session {
    /// Creates the synth and an empty player, then loads the default
    /// SoundFont if one is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the settings are out of range. A default SoundFont
    /// that fails to load is logged and skipped.
    pub fn init(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let synth = Synth::new(&settings);
        let mut player = Player::new();
        player.set_loop(settings.loops)?;

        let shared = Arc::new(Shared::new(Engine { player, synth }, settings.sample_rate));
        let session = Self {
            driver: None,
            shared,
            settings,
            closed: false,
        };

        tracing::info!(
            "Session initialized (driver: {}, {} Hz)",
            session.settings.driver,
            session.settings.sample_rate
        );

        if let Some(path) = session.settings.default_soundfont.clone() {
            if let Err(e) = session.load_soundfont(&path) {
                tracing::warn!("Default SoundFont not loaded: {}", e);
            }
        }

        Ok(session)
    }

    /// Initializes with the named audio driver and an optional SoundFont.
    pub fn open(driver: &str, soundfont: Option<&Path>) -> Result<Self> {
        let mut settings = Settings::with_driver(driver)?;
        settings.default_soundfont = soundfont.map(Path::to_path_buf);
        Self::init(settings)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loads a SoundFont and makes it the active instrument bank.
    ///
    /// Loaded SoundFonts stay loaded until cleanup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSoundFont`] if the file is not a SoundFont, or a
    /// parse error if it is malformed.
    pub fn load_soundfont<P: AsRef<Path>>(&self, path: P) -> Result<FontId> {
        let path = path.as_ref();
        if !format::is_soundfont(path) {
            tracing::warn!("Rejected {}: not a SoundFont", path.display());
            return Err(Error::NotSoundFont(path.to_path_buf()));
        }

        let soundfont = Synth::read_soundfont(path)?;
        let id = self.shared.lock().synth.install(path, soundfont)?;
        tracing::info!("Loaded SoundFont {} (id {})", path.display(), id);
        Ok(id)
    }

    /// Loaded SoundFonts in load order.
    pub fn soundfonts(&self) -> Vec<(FontId, PathBuf)> {
        self.shared.lock().synth.fonts()
    }

    /// Replaces the player with a new one holding `path`.
    ///
    /// Starts the audio driver on the first successful call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMidiFile`] on a format mismatch,
    /// [`Error::PlayerBusy`] while the current player is playing, a parse
    /// error for malformed files, or an audio error if the driver fails to
    /// start.
    pub fn add_midi<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !format::is_midifile(path) {
            tracing::warn!("Rejected {}: not a MIDI file", path.display());
            return Err(Error::NotMidiFile(path.to_path_buf()));
        }
        if self.shared.is_playing() {
            tracing::warn!("Rejected {}: player is busy", path.display());
            return Err(Error::PlayerBusy);
        }

        let sequence = Sequence::load(path)?;
        let mut player = Player::new();
        player.set_loop(self.settings.loops)?;
        player.add(sequence);

        // The current player stays in place if the driver cannot start
        if self.driver.is_none() {
            self.driver = Some(AudioDriver::start(&self.settings, Arc::clone(&self.shared))?);
        }

        {
            let mut engine = self.shared.lock();
            // Playback may have been started from another handle meanwhile
            if engine.player.is_busy() {
                return Err(Error::PlayerBusy);
            }
            engine.replace_player(player);
        }
        self.shared.notify();
        tracing::info!("Queued {}", path.display());
        Ok(())
    }

    /// Starts or resumes playback.
    pub fn play(&self) {
        self.shared.lock().player.play();
        self.shared.notify();
    }

    /// Pauses at the current position.
    pub fn pause(&self) {
        self.shared.lock().pause();
        self.shared.notify();
    }

    /// Stops playback and rewinds.
    pub fn stop(&self) {
        self.shared.lock().stop();
        self.shared.notify();
    }

    /// Blocks the calling thread while the player is playing.
    pub fn wait(&self) {
        self.shared.wait();
    }

    /// Returns true if playback ended before `timeout` elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.shared.wait_timeout(timeout)
    }

    pub fn waiter(&self) -> Waiter {
        Waiter {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.shared.status()
    }

    /// Path of the MIDI file under the play head.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.shared.lock().player.current_file().map(Path::to_path_buf)
    }

    pub fn current_tick(&self) -> u32 {
        self.shared.lock().player.current_tick()
    }

    pub fn total_ticks(&self) -> u32 {
        self.shared.lock().player.total_ticks()
    }

    pub fn seek(&self, tick: u32) {
        self.shared.lock().seek(tick);
    }

    /// Sets the playback speed multiplier of the current player.
    pub fn set_speed(&self, speed: f64) -> Result<()> {
        self.shared.lock().player.set_speed(speed)
    }

    /// Sets the loop count for the current and all later players.
    pub fn set_loop(&mut self, loops: i32) -> Result<()> {
        self.shared.lock().player.set_loop(loops)?;
        self.settings.loops = loops;
        Ok(())
    }

    /// True once an audio driver is running.
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Releases the driver, player, synth and settings.
    pub fn cleanup(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(mut driver) = self.driver.take() {
            driver.shutdown();
        }
        self.shared.lock().replace_player(Player::new());
        self.shared.notify();
        tracing::info!("Session cleaned up");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
