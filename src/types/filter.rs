use super::{Show, Song, Status};

/// Case-insensitive substring search over shows and songs.
/// Blank terms match everything.
#[derive(Debug, Clone, Default)]
pub struct SearchTerms {
    pub anime: Option<String>,
    pub artist: Option<String>,
    pub song: Option<String>,
}

impl SearchTerms {
    pub fn is_show_visible(&self, show: &Show) -> bool {
        let no_song_terms = is_blank(self.song.as_deref()) && is_blank(self.artist.as_deref());

        matches(self.anime.as_deref(), &show.name)
            && (show.songs.iter().any(|song| self.is_song_visible(song))
                || (no_song_terms && show.songs.is_empty()))
    }

    pub fn is_song_visible(&self, song: &Song) -> bool {
        matches(self.song.as_deref(), &song.name) && matches(self.artist.as_deref(), &song.artist)
    }
}

fn is_blank(term: Option<&str>) -> bool {
    term.map_or(true, |term| term.trim().is_empty())
}

fn matches(term: Option<&str>, actual: &str) -> bool {
    match term {
        Some(term) if !term.trim().is_empty() => {
            actual.to_lowercase().contains(&term.to_lowercase())
        }
        _ => true,
    }
}

/// Which songs to show depending on their production state
#[derive(Debug, Clone)]
pub struct SongVisibility {
    pub show_ignored: bool,
    pub show_unsubmitted: bool,
    pub show_completed: bool,
    pub show_missing_mp3: bool,
    pub show_missing_480: bool,
    pub show_missing_720: bool,
}

impl Default for SongVisibility {
    fn default() -> Self {
        Self {
            show_ignored: true,
            show_unsubmitted: true,
            show_completed: true,
            show_missing_mp3: true,
            show_missing_480: true,
            show_missing_720: true,
        }
    }
}

impl SongVisibility {
    pub fn is_visible(&self, song: &Song) -> bool {
        if !self.show_ignored && song.should_ignore {
            return false;
        }
        if !self.show_unsubmitted && song.status.is_unsubmitted() {
            return false;
        }

        (self.show_completed && song.status.is_completed())
            || (self.show_missing_mp3 && song.status.is_missing(Status::MP3))
            || (self.show_missing_480 && song.status.is_missing(Status::RES_480))
            || (self.show_missing_720 && song.status.is_missing(Status::RES_720))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show_with(songs: Vec<Song>) -> Show {
        let mut show = Show::new(1, "Cowboy Bebop", 1998);
        show.songs = songs;
        show
    }

    #[test]
    fn test_blank_terms_match_everything() {
        let terms = SearchTerms {
            anime: Some("  ".to_owned()),
            ..Default::default()
        };
        assert!(terms.is_show_visible(&show_with(vec![Song::new("Tank!", "Seatbelts")])));
        assert!(terms.is_show_visible(&show_with(vec![])));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let terms = SearchTerms {
            anime: Some("bebop".to_owned()),
            artist: Some("SEAT".to_owned()),
            song: None,
        };
        assert!(terms.is_show_visible(&show_with(vec![Song::new("Tank!", "Seatbelts")])));
        assert!(!terms.is_show_visible(&show_with(vec![Song::new("Tank!", "Yoko Kanno")])));
    }

    #[test]
    fn test_song_terms_hide_empty_shows() {
        let terms = SearchTerms {
            song: Some("tank".to_owned()),
            ..Default::default()
        };
        assert!(!terms.is_show_visible(&show_with(vec![])));
    }

    #[test]
    fn test_visibility() {
        let mut song = Song::new("a", "b");
        let hide_unsubmitted = SongVisibility {
            show_unsubmitted: false,
            ..Default::default()
        };
        assert!(!hide_unsubmitted.is_visible(&song));

        song.status = Status::SUBMITTED | Status::COMPLETED;
        let only_missing = SongVisibility {
            show_completed: false,
            ..Default::default()
        };
        assert!(!only_missing.is_visible(&song));
        assert!(SongVisibility::default().is_visible(&song));

        song.should_ignore = true;
        let hide_ignored = SongVisibility {
            show_ignored: false,
            ..Default::default()
        };
        assert!(!hide_ignored.is_visible(&song));
    }
}
