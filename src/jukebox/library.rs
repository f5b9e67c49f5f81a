//! MIDI library scanning.
//!
//! A directory containing a file named `order` (anywhere below the root,
//! but not the root itself) is an album: each line of `order` names a file
//! in that directory, in playback order. Every other MIDI file is a track
//! of its own.

use crate::error::Result;
use crate::format;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Album track listing file name.
pub const ORDER_FILE: &str = "order";

/// Something that can be queued: a single track or a whole album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playable {
    /// A directory with an `order` file.
    Album { name: String, tracks: Vec<String> },
    /// A lone MIDI file, named by its path relative to the root.
    Track { name: String },
}

impl Playable {
    pub fn name(&self) -> &str {
        match self {
            Playable::Album { name, .. } | Playable::Track { name } => name,
        }
    }

    /// File names in playback order, as shown to the user.
    pub fn file_names(&self) -> Vec<&str> {
        match self {
            Playable::Album { tracks, .. } => tracks.iter().map(String::as_str).collect(),
            Playable::Track { name } => vec![name.as_str()],
        }
    }

    /// Full paths in playback order.
    pub fn file_paths(&self, root: &Path) -> Vec<PathBuf> {
        match self {
            Playable::Album { name, tracks } => {
                let dir = root.join(name);
                tracks.iter().map(|t| dir.join(t)).collect()
            }
            Playable::Track { name } => vec![root.join(name)],
        }
    }
}

/// All playables found under a root directory, keyed by name.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    playables: BTreeMap<String, Playable>,
}

impl Library {
    /// Walks `root` and collects albums and tracks.
    ///
    /// Unreadable directories are skipped. A missing root yields an empty
    /// library.
    ///
    /// # Errors
    ///
    /// Returns error if an `order` file exists but cannot be read.
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        let mut playables = BTreeMap::new();
        let mut in_album: HashSet<PathBuf> = HashSet::new();

        for file in &files {
            let Some(rel) = relative_name(&root, file) else {
                continue;
            };
            let is_order = file.file_name().is_some_and(|n| n == ORDER_FILE);
            // Albums live at least one level below the root
            let Some((album_name, _)) = rel.rsplit_once('/') else {
                continue;
            };
            if !is_order {
                continue;
            }

            let tracks: Vec<String> = fs::read_to_string(file)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();

            let dir = root.join(album_name);
            for track in &tracks {
                in_album.insert(dir.join(track));
            }

            tracing::debug!("Album '{}' with {} tracks", album_name, tracks.len());
            playables.insert(
                album_name.to_string(),
                Playable::Album {
                    name: album_name.to_string(),
                    tracks,
                },
            );
        }

        for file in &files {
            if in_album.contains(file) || !format::is_midifile(file) {
                continue;
            }
            if let Some(name) = relative_name(&root, file) {
                playables.insert(name.clone(), Playable::Track { name });
            }
        }

        tracing::info!("Library {}: {} playables", root.display(), playables.len());
        Ok(Self { root, playables })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, name: &str) -> Option<&Playable> {
        self.playables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.playables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.playables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playables.is_empty()
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.playables.keys().map(String::as_str)
    }

    /// A uniformly random playable name accepted by `filter`.
    pub fn random_name<R, F>(&self, rng: &mut R, filter: F) -> Option<&str>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        let names: Vec<&str> = self.names().filter(|name| filter(name)).collect();
        names.choose(rng).copied()
    }
}

/// `file` relative to `root`, with `/` separators.
fn relative_name(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
