//! A queue-driven jukebox on top of a [`Session`].
//!
//! Reads [`Command`]s from a channel, plays queued tracks and albums file
//! by file, and picks random playables when the queue is empty and
//! autoplay is on.

mod command;
mod library;
mod notify;

pub use command::Command;
pub use library::{Library, Playable, ORDER_FILE};
pub use notify::{notifier_from, CommandNotifier, LogNotifier, Notifier};

use crate::player::PlayerStatus;
use crate::session::Session;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// How often playback status is checked while waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The playable currently being worked through.
struct NowPlaying {
    name: String,
    files: Vec<String>,
    paths: Vec<PathBuf>,
    /// Index of the file handed to the session.
    index: usize,
    /// Whether any file of this playable was accepted by the session.
    started: bool,
}

/// Jukebox state: library, queue and the session playing it.
pub struct Jukebox {
    session: Session,
    library: Library,
    notifier: Box<dyn Notifier>,
    queue: VecDeque<String>,
    autoplay: bool,
    quit: bool,
    now_playing: Option<NowPlaying>,
    /// Playables none of whose files could be played; never autoplayed.
    unplayable: HashSet<String>,
}

impl Jukebox {
    pub fn new(session: Session, library: Library, notifier: Box<dyn Notifier>) -> Self {
        Self {
            session,
            library,
            notifier,
            queue: VecDeque::new(),
            autoplay: true,
            quit: false,
            now_playing: None,
            unplayable: HashSet::new(),
        }
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Names waiting to be played, front first.
    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Runs until `q` or the end of input. Returns the session for cleanup.
    pub fn run(mut self, input: Receiver<String>) -> Session {
        while !self.quit {
            if self.now_playing.is_none() {
                self.pick_next(&input);
                continue;
            }

            match input.recv_timeout(POLL_INTERVAL) {
                Ok(line) => self.handle_line(&line),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => self.quit(),
            }

            if !self.quit && self.session.status().is_finished() {
                self.advance_file();
            }
        }

        self.session.stop();
        self.session
    }

    /// Applies one input line.
    pub fn handle_line(&mut self, line: &str) {
        let Some(command) = Command::parse(line) else {
            return;
        };
        tracing::debug!("Command {:?}", command);

        match command {
            Command::Next => self.session.stop(),
            Command::ToggleAutoplay => {
                self.autoplay = !self.autoplay;
                tracing::info!("Autoplay {}", if self.autoplay { "on" } else { "off" });
            }
            Command::Quit => self.quit(),
            Command::TogglePause => match self.session.status() {
                PlayerStatus::Playing => self.session.pause(),
                PlayerStatus::Paused => self.session.play(),
                _ => {}
            },
            Command::List => {
                let names: Vec<&str> = self.library.names().collect();
                self.notifier.notify(&names.join("\n"));
            }
            Command::Enqueue(name) => {
                if self.library.contains(&name) {
                    self.queue.push_back(name);
                } else {
                    self.notifier.notify("Track or album doesn't exist");
                }
            }
        }
    }

    fn quit(&mut self) {
        self.quit = true;
        self.session.stop();
    }

    /// Starts the next queued playable, refilling or blocking when the queue is empty.
    fn pick_next(&mut self, input: &Receiver<String>) {
        if let Some(name) = self.queue.pop_front() {
            self.begin(name);
            return;
        }

        if self.autoplay {
            let unplayable = &self.unplayable;
            let pick = self
                .library
                .random_name(&mut rand::thread_rng(), |name| !unplayable.contains(name));
            if let Some(name) = pick {
                let name = name.to_string();
                self.queue.push_back(name);
                return;
            }
            tracing::warn!("Nothing left to autoplay");
        }

        self.notifier.notify("No more tracks in queue");
        match input.recv() {
            Ok(line) => self.handle_line(&line),
            Err(_) => self.quit(),
        }
    }

    fn begin(&mut self, name: String) {
        let Some(playable) = self.library.get(&name) else {
            return;
        };
        let files = playable.file_names().into_iter().map(str::to_string).collect();
        let paths = playable.file_paths(self.library.root());
        self.now_playing = Some(NowPlaying {
            name,
            files,
            paths,
            index: 0,
            started: false,
        });
        self.start_current();
    }

    fn advance_file(&mut self) {
        if let Some(now) = self.now_playing.as_mut() {
            now.index += 1;
        }
        self.start_current();
    }

    /// Hands the current file to the session, skipping files it rejects.
    fn start_current(&mut self) {
        loop {
            let Some(now) = self.now_playing.as_mut() else {
                return;
            };
            let Some(path) = now.paths.get(now.index) else {
                if !now.started {
                    tracing::warn!("No playable files in '{}'", now.name);
                    self.unplayable.insert(now.name.clone());
                }
                self.now_playing = None;
                return;
            };

            match self.session.add_midi(path) {
                Ok(()) => {
                    now.started = true;
                    self.session.play();
                    let message = now_playing_message(&now.name, &now.files, now.index);
                    self.notifier.notify(&message);
                    return;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    now.index += 1;
                }
            }
        }
    }
}

/// `"album > file (i/n)"` for multi-file playables, else just the name.
fn now_playing_message(name: &str, files: &[String], index: usize) -> String {
    if files.len() > 1 {
        format!("{} > {} ({}/{})", name, files[index], index + 1, files.len())
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::fixture::{single_note, write_file};
    use std::fs;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Collects notifications for inspection.
    #[derive(Clone, Default)]
    struct Collect(Arc<Mutex<Vec<String>>>);

    impl Notifier for Collect {
        fn notify(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn jukebox(dir: &TempDir) -> (Jukebox, Collect) {
        let root = dir.path();
        let midi = single_note(48);
        fs::create_dir_all(root.join("suite")).unwrap();
        write_file(&root.join("suite/one.mid"), &midi);
        write_file(&root.join("suite/two.mid"), &midi);
        fs::write(root.join("suite/order"), "one.mid\nmissing.mid\ntwo.mid\n").unwrap();
        write_file(&root.join("solo.mid"), &midi);

        let session = Session::open("null", None).unwrap();
        let library = Library::scan(root).unwrap();
        let notes = Collect::default();
        (Jukebox::new(session, library, Box::new(notes.clone())), notes)
    }

    #[test]
    fn test_now_playing_message() {
        let files = vec!["a.mid".to_string(), "b.mid".to_string()];
        assert_eq!(now_playing_message("suite", &files, 1), "suite > b.mid (2/2)");
        assert_eq!(now_playing_message("solo.mid", &files[..1], 0), "solo.mid");
    }

    #[test]
    fn test_enqueue_unknown_notifies() {
        let dir = TempDir::new().unwrap();
        let (mut jukebox, notes) = jukebox(&dir);
        jukebox.handle_line("p nowhere.mid");
        jukebox.handle_line("p solo.mid");
        jukebox.handle_line("a");

        assert_eq!(jukebox.queue().collect::<Vec<_>>(), vec!["solo.mid"]);
        assert!(!jukebox.autoplay());
        assert_eq!(*notes.0.lock().unwrap(), vec!["Track or album doesn't exist"]);
    }

    #[test]
    fn test_plays_queue_then_quits_at_end_of_input() {
        let dir = TempDir::new().unwrap();
        let (mut jukebox, notes) = jukebox(&dir);
        jukebox.set_autoplay(false);

        let (tx, rx) = mpsc::channel();
        tx.send("p suite".to_string()).unwrap();
        tx.send("p solo.mid".to_string()).unwrap();

        let feeder = std::thread::spawn(move || {
            // Long enough for both queued playables at 50ms per file
            std::thread::sleep(Duration::from_millis(1500));
            drop(tx);
        });

        let session = jukebox.run(rx);
        feeder.join().unwrap();
        assert_ne!(session.status(), PlayerStatus::Playing);
        session.cleanup();

        let notes = notes.0.lock().unwrap();
        assert_eq!(notes[0], "No more tracks in queue");
        assert!(notes.contains(&"suite > one.mid (1/3)".to_string()));
        assert!(notes.contains(&"suite > two.mid (3/3)".to_string()));
        assert!(notes.contains(&"solo.mid".to_string()));
        assert!(!notes.iter().any(|n| n.contains("missing.mid")));
    }

    #[test]
    fn test_list_notifies_names() {
        let dir = TempDir::new().unwrap();
        let (mut jukebox, notes) = jukebox(&dir);
        jukebox.handle_line("l");
        assert_eq!(*notes.0.lock().unwrap(), vec!["solo.mid\nsuite"]);
    }

    #[test]
    fn test_autoplay_skips_unplayable_library() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("ghosts")).unwrap();
        fs::write(root.join("ghosts/order"), "gone.mid\nalso-gone.mid\n").unwrap();

        let session = Session::open("null", None).unwrap();
        let library = Library::scan(root).unwrap();
        assert!(library.contains("ghosts"));
        let notes = Collect::default();
        let jukebox = Jukebox::new(session, library, Box::new(notes.clone()));
        assert!(jukebox.autoplay());

        let (tx, rx) = mpsc::channel::<String>();
        let handle = std::thread::spawn(move || jukebox.run(rx));
        std::thread::sleep(Duration::from_millis(200));
        drop(tx);

        let session = handle.join().unwrap();
        session.cleanup();
        assert_eq!(*notes.0.lock().unwrap(), vec!["No more tracks in queue"]);
    }
}
