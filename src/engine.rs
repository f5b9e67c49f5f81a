//! State shared between the control side and the audio thread.

use crate::player::{Player, PlayerStatus};
use crate::synth::Synth;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// The player and the synth it drives.
///
/// Field order is drop order: the player goes before the synth it is bound to.
pub(crate) struct Engine {
    pub(crate) player: Player,
    pub(crate) synth: Synth,
}

impl Engine {
    /// Stops the player and silences the synth.
    pub(crate) fn stop(&mut self) {
        let Engine { player, synth } = self;
        player.stop(synth);
    }

    pub(crate) fn pause(&mut self) {
        let Engine { player, synth } = self;
        player.pause(synth);
    }

    pub(crate) fn seek(&mut self, tick: u32) {
        let Engine { player, synth } = self;
        player.seek(tick, synth);
    }

    /// Swaps in a new player, releasing notes the old one left sounding.
    pub(crate) fn replace_player(&mut self, player: Player) {
        let mut old = std::mem::replace(&mut self.player, player);
        old.release(&mut self.synth);
    }
}

/// Engine behind a mutex plus a condvar signalled on player status changes.
pub(crate) struct Shared {
    engine: Mutex<Engine>,
    status_changed: Condvar,
    sample_rate: u32,
}

impl Shared {
    pub(crate) fn new(engine: Engine, sample_rate: u32) -> Self {
        Self {
            engine: Mutex::new(engine),
            status_changed: Condvar::new(),
            sample_rate,
        }
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Locks the engine. A panic on the audio thread does not make the
    /// engine unusable for the control side.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wakes everyone blocked in [`Shared::wait`].
    pub(crate) fn notify(&self) {
        self.status_changed.notify_all();
    }

    pub(crate) fn status(&self) -> PlayerStatus {
        self.lock().player.status()
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.lock().player.is_busy()
    }

    /// Advances the player by one block and renders it.
    pub(crate) fn render(&self, left: &mut [f32], right: &mut [f32]) {
        let mut engine = self.lock();
        let before = engine.player.status();

        let Engine { player, synth } = &mut *engine;
        player.advance(left.len(), self.sample_rate, synth);
        synth.render(left, right);

        let changed = player.status() != before;
        drop(engine);
        if changed {
            self.notify();
        }
    }

    /// Blocks while the player is playing.
    pub(crate) fn wait(&self) {
        let mut engine = self.lock();
        while engine.player.is_busy() {
            engine = self
                .status_changed
                .wait(engine)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Shared::wait`] but gives up after `timeout`.
    /// Returns true if playback is no longer running.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut engine = self.lock();
        while engine.player.is_busy() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            engine = self
                .status_changed
                .wait_timeout(engine, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
        true
    }
}
