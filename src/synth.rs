//! SoundFont loading and the synthesizer behind the player.
//!
//! Wraps `rustysynth`. Loaded SoundFonts stack up and cannot be removed;
//! the most recently loaded one drives the active synthesizer.

use crate::error::{Error, Result};
use crate::midi::{ChannelMessage, MidiSink};
use crate::settings::Settings;
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier handed out for each loaded SoundFont, starting at 1.
pub type FontId = u32;

/// A SoundFont that has been installed into the synth.
struct LoadedFont {
    id: FontId,
    path: PathBuf,
    /// Kept alive for the lifetime of the synth even once superseded.
    _soundfont: Arc<SoundFont>,
}

/// The synthesizer and the SoundFonts loaded into it.
pub struct Synth {
    settings: SynthesizerSettings,
    gain: f32,
    fonts: Vec<LoadedFont>,
    next_id: FontId,
    /// Absent until the first SoundFont is installed.
    synthesizer: Option<Synthesizer>,
}

impl Synth {
    /// Creates an empty synth. It renders silence until a SoundFont is installed.
    pub fn new(settings: &Settings) -> Self {
        let mut synth_settings = SynthesizerSettings::new(settings.sample_rate as i32);
        synth_settings.maximum_polyphony = settings.polyphony;
        synth_settings.enable_reverb_and_chorus = settings.reverb_and_chorus;

        Self {
            settings: synth_settings,
            gain: settings.gain,
            fonts: Vec::new(),
            next_id: 1,
            synthesizer: None,
        }
    }

    /// Parses a SoundFont file.
    ///
    /// Kept separate from [`Synth::install`] so the parse can run without
    /// holding the engine lock.
    pub fn read_soundfont(path: &Path) -> Result<Arc<SoundFont>> {
        let mut reader = BufReader::new(File::open(path)?);
        let soundfont = SoundFont::new(&mut reader).map_err(|e| Error::SoundFont {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Arc::new(soundfont))
    }

    /// Makes `soundfont` the active instrument bank.
    ///
    /// Sounding notes are cut: the synthesizer is rebuilt.
    pub fn install(&mut self, path: &Path, soundfont: Arc<SoundFont>) -> Result<FontId> {
        let mut synthesizer = Synthesizer::new(&soundfont, &self.settings)
            .map_err(|e| Error::Synthesizer(format!("{:?}", e)))?;
        synthesizer.set_master_volume(self.gain);

        let id = self.next_id;
        self.next_id += 1;
        self.fonts.push(LoadedFont {
            id,
            path: path.to_path_buf(),
            _soundfont: soundfont,
        });
        self.synthesizer = Some(synthesizer);

        tracing::debug!("Installed SoundFont {} as font {}", path.display(), id);
        Ok(id)
    }

    /// Loaded SoundFonts in load order.
    pub fn fonts(&self) -> Vec<(FontId, PathBuf)> {
        self.fonts.iter().map(|f| (f.id, f.path.clone())).collect()
    }

    pub fn has_soundfont(&self) -> bool {
        self.synthesizer.is_some()
    }

    /// Renders one block of stereo audio.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        match self.synthesizer.as_mut() {
            Some(synth) => synth.render(left, right),
            None => {
                left.fill(0.0);
                right.fill(0.0);
            }
        }
    }
}

impl MidiSink for Synth {
    fn process(&mut self, message: ChannelMessage) {
        if let Some(synth) = self.synthesizer.as_mut() {
            synth.process_midi_message(
                message.channel as i32,
                message.command as i32,
                message.data1 as i32,
                message.data2 as i32,
            );
        }
    }

    fn all_notes_off(&mut self, immediate: bool) {
        if let Some(synth) = self.synthesizer.as_mut() {
            synth.note_off_all(immediate);
        }
    }
}
