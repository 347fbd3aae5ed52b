use std::{collections::BTreeSet, fmt::Display, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{AspectRatio, Status, Timestamp, VolumeModifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SongType {
    Opening,
    Ending,
    Insert,
}

impl Display for SongType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SongType::Opening => write!(f, "Opening"),
            SongType::Ending => write!(f, "Ending"),
            SongType::Insert => write!(f, "Insert"),
        }
    }
}

/// The kind of a song and its optional position among the songs of the
/// same kind, e.g. "Opening 2".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SongTypeAndPosition {
    pub song_type: SongType,
    pub position: Option<u32>,
}

impl SongTypeAndPosition {
    pub fn new(song_type: SongType, position: Option<u32>) -> Self {
        Self {
            song_type,
            position,
        }
    }
}

impl Display for SongTypeAndPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some(position) => write!(f, "{} {position}", self.song_type),
            None => write!(f, "{}", self.song_type),
        }
    }
}

impl FromStr for SongTypeAndPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let song_type = match words.next().map(str::to_lowercase).as_deref() {
            Some("opening" | "op") => SongType::Opening,
            Some("ending" | "ed") => SongType::Ending,
            Some("insert" | "in") => SongType::Insert,
            _ => return Err(format!("Unknown song type in '{s}'")),
        };

        let position = match words.next() {
            Some(n) => Some(
                n.trim_start_matches('#')
                    .parse()
                    .map_err(|_| format!("Invalid song position '{n}' in '{s}'"))?,
            ),
            None => None,
        };

        if words.next().is_some() {
            return Err(format!("Trailing data after song type in '{s}'"));
        }

        Ok(Self {
            song_type,
            position,
        })
    }
}

impl TryFrom<String> for SongTypeAndPosition {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SongTypeAndPosition> for String {
    fn from(value: SongTypeAndPosition) -> Self {
        value.to_string()
    }
}

/// One music cue of a show, with its timing, overrides and production state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    pub artist: String,
    #[serde(rename = "type", default)]
    pub song_type: Option<SongTypeAndPosition>,
    #[serde(default)]
    pub start: Timestamp,
    #[serde(default)]
    pub end: Timestamp,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub episode: Option<u32>,
    /// Alternate audio source, relative to the show directory
    #[serde(default)]
    pub clean_path: Option<PathBuf>,
    #[serde(default)]
    pub override_aspect_ratio: Option<AspectRatio>,
    #[serde(default)]
    pub override_audio_track: u32,
    #[serde(default)]
    pub override_video_track: u32,
    #[serde(default)]
    pub volume_modifier: Option<VolumeModifier>,
    #[serde(default)]
    pub should_ignore: bool,
    /// Other shows this exact song also belongs to
    #[serde(default)]
    pub also_in: BTreeSet<u32>,
}

impl Song {
    /// A new song as a catalog returns it: not submitted and with unset times
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            song_type: None,
            start: Timestamp::ZERO,
            end: Timestamp::ZERO,
            status: Status::empty(),
            episode: None,
            clean_path: None,
            override_aspect_ratio: None,
            override_audio_track: 0,
            override_video_track: 0,
            volume_modifier: None,
            should_ignore: false,
            also_in: BTreeSet::new(),
        }
    }

    pub fn with_type(mut self, song_type: SongType, position: Option<u32>) -> Self {
        self.song_type = Some(SongTypeAndPosition::new(song_type, position));
        self
    }

    #[cfg(test)]
    pub fn with_times(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn has_valid_times(&self) -> bool {
        self.start < self.end
    }

    pub fn length(&self) -> Option<Timestamp> {
        self.has_valid_times()
            .then(|| Timestamp::from(*self.end - *self.start))
    }

    /// `{Artist} - {Name} [{Type} {Position}]`, the type part being left out
    /// when it is unknown
    pub fn full_name(&self) -> String {
        match &self.song_type {
            Some(song_type) => format!("{} - {} [{song_type}]", self.artist, self.name),
            None => format!("{} - {}", self.artist, self.name),
        }
    }
}

impl Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
