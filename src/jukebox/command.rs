//! Jukebox commands, one per input line.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `n`: skip to the next file.
    Next,
    /// `a`: toggle autoplay.
    ToggleAutoplay,
    /// `q`: stop and quit.
    Quit,
    /// `s`: pause or resume.
    TogglePause,
    /// `l`: list playable names.
    List,
    /// `p <name>`: queue a track or album.
    Enqueue(String),
}

impl Command {
    /// Parses one line. Unknown input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.trim() {
            "n" => Some(Command::Next),
            "a" => Some(Command::ToggleAutoplay),
            "q" => Some(Command::Quit),
            "s" => Some(Command::TogglePause),
            "l" => Some(Command::List),
            _ => {
                // Names may contain spaces, so everything after "p " counts
                let name = line.trim_start().strip_prefix("p ")?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some(Command::Enqueue(name.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_letter_commands() {
        assert_eq!(Command::parse("n"), Some(Command::Next));
        assert_eq!(Command::parse("a\n"), Some(Command::ToggleAutoplay));
        assert_eq!(Command::parse("q\r\n"), Some(Command::Quit));
        assert_eq!(Command::parse(" s "), Some(Command::TogglePause));
        assert_eq!(Command::parse("l"), Some(Command::List));
    }

    #[test]
    fn test_enqueue() {
        assert_eq!(
            Command::parse("p albums/suite"),
            Some(Command::Enqueue("albums/suite".to_string()))
        );
        assert_eq!(
            Command::parse("p Song With Spaces.mid"),
            Some(Command::Enqueue("Song With Spaces.mid".to_string()))
        );
        assert_eq!(Command::parse("p "), None);
        assert_eq!(Command::parse("p"), None);
    }

    #[test]
    fn test_unknown_input() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("next"), None);
        assert_eq!(Command::parse("x y"), None);
        assert_eq!(Command::parse("list"), None);
    }
}
