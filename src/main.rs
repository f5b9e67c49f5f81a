//! midijuke - play MIDI files through a SoundFont, or run a jukebox.
//!
//! # Usage
//!
//! ```bash
//! midijuke song.mid other.mid        # Play files in order, then exit
//! midijuke                           # Jukebox over ~/music/midi
//! midijuke -a file -o out.wav a.mid  # Render to a WAV file
//! ```
//!
//! Jukebox commands, one per line on stdin: `p <name>` queue, `n` next,
//! `s` pause/resume, `a` toggle autoplay, `l` list, `q` quit.

use anyhow::{Context, Result};
use clap::Parser;
use midijuke::jukebox::{notifier_from, Jukebox, Library};
use midijuke::{Config, Session};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "midijuke")]
#[command(about = "SoundFont MIDI player and jukebox", long_about = None)]
struct Args {
    /// MIDI files to play in order; without files, runs the jukebox
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, value_name = "PATH", env = midijuke::config::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Audio driver: alsa, pulseaudio, jack, coreaudio, default, null, file
    #[arg(short = 'a', long, value_name = "NAME")]
    driver: Option<String>,

    /// SoundFont file (.sf2)
    #[arg(short, long, value_name = "PATH")]
    soundfont: Option<PathBuf>,

    /// MIDI library root for the jukebox
    #[arg(short, long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Do not pick random tracks when the queue is empty
    #[arg(long)]
    no_autoplay: bool,

    /// Desktop notification command, e.g. notify-send
    #[arg(long, value_name = "CMD")]
    notify_cmd: Option<String>,

    /// Master gain
    #[arg(short, long, value_name = "GAIN")]
    gain: Option<f32>,

    /// WAV output path for the file driver
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Times to play each file; negative loops forever
    #[arg(long, value_name = "N", allow_hyphen_values = true)]
    loops: Option<i32>,

    /// List library playables and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    /// Applies command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(driver) = &self.driver {
            config.driver = driver.clone();
        }
        if let Some(soundfont) = &self.soundfont {
            config.soundfont = soundfont.clone();
        }
        if let Some(library) = &self.library {
            config.library = library.clone();
        }
        if self.no_autoplay {
            config.autoplay = false;
        }
        if let Some(cmd) = &self.notify_cmd {
            config.notify_command = Some(cmd.clone());
        }
        if let Some(gain) = self.gain {
            config.gain = gain;
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;
    args.apply(&mut config);

    if args.list {
        let library = Library::scan(&config.library)
            .with_context(|| format!("Failed to scan {}", config.library.display()))?;
        for name in library.names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let mut settings = config.settings().context("Invalid settings")?;
    if let Some(loops) = args.loops {
        settings.loops = loops;
    }
    let session = Session::init(settings).context("Failed to initialize player")?;

    if args.files.is_empty() {
        run_jukebox(session, &config)
    } else {
        play_files(session, &args.files)
    }
}

/// Plays each file to the end, one after another.
fn play_files(mut session: Session, files: &[PathBuf]) -> Result<()> {
    for file in files {
        if let Err(e) = session.add_midi(file) {
            tracing::error!("Cannot play {}: {}", file.display(), e);
            continue;
        }
        session.play();
        session.wait();
    }
    session.cleanup();
    Ok(())
}

/// Runs the jukebox over the configured library, reading commands from stdin.
fn run_jukebox(session: Session, config: &Config) -> Result<()> {
    let library = Library::scan(&config.library)
        .with_context(|| format!("Failed to scan {}", config.library.display()))?;
    if library.is_empty() {
        eprintln!("No playable MIDI files in {}", config.library.display());
        session.cleanup();
        return Ok(());
    }

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut jukebox = Jukebox::new(
        session,
        library,
        notifier_from(config.notify_command.as_deref()),
    );
    jukebox.set_autoplay(config.autoplay);

    let session = jukebox.run(rx);
    session.cleanup();
    Ok(())
}
