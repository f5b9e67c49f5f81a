//! Configuration loading.
//!
//! Resolution order:
//! 1. Command-line flags (applied by the binary on top of the loaded config)
//! 2. An explicit config file, from `--config` or `MIDIJUKE_CONFIG`
//! 3. The user config file `<config_dir>/midijuke/config.toml`
//! 4. Compiled defaults

use crate::error::{Error, Result};
use crate::settings::{Settings, DEFAULT_DRIVER, DEFAULT_SAMPLE_RATE, DEFAULT_SOUNDFONT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "MIDIJUKE_CONFIG";

/// Player and jukebox configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Audio driver name (`alsa`, `pulseaudio`, `null`, `file`, ...).
    pub driver: String,
    /// SoundFont loaded at startup. An empty path disables it.
    pub soundfont: PathBuf,
    /// Root of the MIDI library scanned by the jukebox.
    pub library: PathBuf,
    /// Pick random playables when the queue runs dry.
    pub autoplay: bool,
    /// Desktop notification command, e.g. `notify-send`. Logs when unset.
    pub notify_command: Option<String>,
    pub sample_rate: u32,
    pub gain: f32,
    pub polyphony: usize,
    pub reverb_and_chorus: bool,
    /// WAV output path for the `file` driver.
    pub output_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            driver: DEFAULT_DRIVER.to_string(),
            soundfont: PathBuf::from(DEFAULT_SOUNDFONT),
            library: default_library(),
            autoplay: true,
            notify_command: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            gain: 1.0,
            polyphony: 64,
            reverb_and_chorus: true,
            output_file: PathBuf::from("midijuke.wav"),
        }
    }
}

impl Config {
    /// Parses TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Loads the explicit file if given (it must exist), else the user
    /// config file if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match user_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!("Using config file {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Builds session settings from this config.
    pub fn settings(&self) -> Result<Settings> {
        let settings = Settings {
            driver: self.driver.parse()?,
            sample_rate: self.sample_rate,
            gain: self.gain,
            polyphony: self.polyphony,
            reverb_and_chorus: self.reverb_and_chorus,
            output_file: self.output_file.clone(),
            default_soundfont: if self.soundfont.as_os_str().is_empty() {
                None
            } else {
                Some(self.soundfont.clone())
            },
            ..Settings::default()
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// `<config_dir>/midijuke/config.toml` for the current user.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("midijuke").join("config.toml"))
}

/// `~/music/midi`, or a relative fallback without a home directory.
fn default_library() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("music").join("midi"))
        .unwrap_or_else(|| PathBuf::from("music/midi"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::AudioBackend;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config = Config::from_toml_str(
            r#"
            driver = "null"
            autoplay = false
            soundfont = ""
            notify_command = "notify-send -t 2000"
            "#,
        )
        .unwrap();
        assert_eq!(config.driver, "null");
        assert!(!config.autoplay);
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);

        let settings = config.settings().unwrap();
        assert_eq!(settings.driver, AudioBackend::Null);
        assert!(settings.default_soundfont.is_none());
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("volume = 3"),
            Err(Error::Config(_))
        ));
        let config = Config::from_toml_str("driver = \"theremin\"").unwrap();
        assert!(matches!(config.settings(), Err(Error::UnknownDriver(_))));
        let config = Config::from_toml_str("sample_rate = 1000").unwrap();
        assert!(matches!(config.settings(), Err(Error::InvalidSetting(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "library = \"/srv/midi\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.library, PathBuf::from("/srv/midi"));

        assert!(Config::load(Some(Path::new("/nonexistent/midijuke.toml"))).is_err());
    }
}
