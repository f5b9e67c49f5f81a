//! Session settings and audio backend selection.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// SoundFont loaded at init when none is configured.
pub const DEFAULT_SOUNDFONT: &str = "/usr/share/soundfonts/default.sf2";

/// Audio driver used when none is named.
pub const DEFAULT_DRIVER: &str = "alsa";

/// System backend names accepted by [`AudioBackend::from_str`].
///
/// All of them open the default output device through rodio; the name only
/// records what the caller asked for.
const SYSTEM_BACKENDS: &[&str] = &[
    "default",
    "alsa",
    "pulseaudio",
    "pipewire",
    "jack",
    "oss",
    "sndio",
    "coreaudio",
    "wasapi",
    "dsound",
    "waveout",
];

/// Where rendered audio goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioBackend {
    /// The host's default output device.
    System(String),
    /// Rendered in real time and discarded.
    Null,
    /// Rendered as fast as possible into a WAV file.
    File,
}

impl FromStr for AudioBackend {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "null" => Ok(AudioBackend::Null),
            "file" => Ok(AudioBackend::File),
            other if SYSTEM_BACKENDS.contains(&other) => Ok(AudioBackend::System(name)),
            _ => Err(Error::UnknownDriver(name)),
        }
    }
}

impl fmt::Display for AudioBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioBackend::System(name) => write!(f, "{}", name),
            AudioBackend::Null => write!(f, "null"),
            AudioBackend::File => write!(f, "file"),
        }
    }
}

/// Everything a [`Session`](crate::Session) is created from.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Audio backend started on the first attached MIDI file.
    pub driver: AudioBackend,
    /// Synthesis sample rate in Hz.
    pub sample_rate: u32,
    /// Master volume applied to the synthesizer.
    pub gain: f32,
    /// Maximum number of simultaneous voices.
    pub polyphony: usize,
    pub reverb_and_chorus: bool,
    /// Output path for the `file` backend.
    pub output_file: PathBuf,
    /// SoundFont loaded at init; a failed load is logged, not fatal.
    pub default_soundfont: Option<PathBuf>,
    /// Playlist repetitions per player; negative loops forever.
    pub loops: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            driver: AudioBackend::System(DEFAULT_DRIVER.to_string()),
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: 1.0,
            polyphony: 64,
            reverb_and_chorus: true,
            output_file: PathBuf::from("midijuke.wav"),
            default_soundfont: Some(PathBuf::from(DEFAULT_SOUNDFONT)),
            loops: 1,
        }
    }
}

impl Settings {
    /// Default settings with the named audio driver and no default SoundFont.
    pub fn with_driver(name: &str) -> Result<Self> {
        Ok(Self {
            driver: name.parse()?,
            default_soundfont: None,
            ..Self::default()
        })
    }

    /// Checks values against the ranges the synthesizer accepts.
    pub fn validate(&self) -> Result<()> {
        if !(16_000..=192_000).contains(&self.sample_rate) {
            return Err(Error::InvalidSetting(format!(
                "sample rate {} outside 16000..=192000",
                self.sample_rate
            )));
        }
        if !(8..=256).contains(&self.polyphony) {
            return Err(Error::InvalidSetting(format!(
                "polyphony {} outside 8..=256",
                self.polyphony
            )));
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(Error::InvalidSetting(format!("gain {}", self.gain)));
        }
        if self.loops == 0 {
            return Err(Error::InvalidSetting("loop count of zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!("null".parse::<AudioBackend>().unwrap(), AudioBackend::Null);
        assert_eq!("FILE".parse::<AudioBackend>().unwrap(), AudioBackend::File);
        assert_eq!(
            "alsa".parse::<AudioBackend>().unwrap(),
            AudioBackend::System("alsa".to_string())
        );
        assert!(matches!(
            "carrier-pigeon".parse::<AudioBackend>(),
            Err(Error::UnknownDriver(_))
        ));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(Settings::default().validate().is_ok());

        let mut settings = Settings::default();
        settings.sample_rate = 8000;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.polyphony = 1000;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.gain = f32::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.loops = -1;
        assert!(settings.validate().is_ok());
    }
}
