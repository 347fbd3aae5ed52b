use std::{collections::HashMap, fmt::Display, path::PathBuf};

use serde::Serialize;

use crate::types::{Show, Song, SongTypeAndPosition};

/// Why a song cannot be processed as is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixReason {
    #[serde(rename = "blank name")]
    BlankName,
    #[serde(rename = "blank artist")]
    BlankArtist,
    /// Start is not before end, which includes unset times
    #[serde(rename = "invalid times")]
    InvalidTimes,
    #[serde(rename = "unset song type")]
    UnsetSongType,
    /// Another song of the show has the same type and position
    #[serde(rename = "ambiguous song type")]
    AmbiguousSongType,
}

impl Display for FixReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            FixReason::BlankName => "blank name",
            FixReason::BlankArtist => "blank artist",
            FixReason::InvalidTimes => "invalid times",
            FixReason::UnsetSongType => "unset song type",
            FixReason::AmbiguousSongType => "ambiguous song type",
        };
        write!(f, "{reason}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixEntry {
    pub show_id: u32,
    pub song_index: usize,
    pub song: String,
    pub reasons: Vec<FixReason>,
}

/// The fixes found for one show, and where they were written
#[derive(Debug, Clone)]
pub struct FixReport {
    pub show_id: u32,
    /// `None` when the report could not be written
    pub path: Option<PathBuf>,
    pub entries: Vec<FixEntry>,
}

/// List the songs of the show that need fixing, in song order.
/// Ignored songs are never listed.
pub fn find_fixes(show: &Show) -> Vec<FixEntry> {
    let active = || show.songs.iter().filter(|song| !song.should_ignore);

    let mut type_counts = HashMap::new();
    for song_type in active().filter_map(|song| song.song_type) {
        *type_counts.entry(song_type).or_insert(0usize) += 1;
    }

    show.songs
        .iter()
        .enumerate()
        .filter(|(_, song)| !song.should_ignore)
        .filter_map(|(song_index, song)| {
            let reasons = song_reasons(song, &type_counts);
            (!reasons.is_empty()).then(|| FixEntry {
                show_id: show.id,
                song_index,
                song: song.full_name(),
                reasons,
            })
        })
        .collect()
}

fn song_reasons(song: &Song, type_counts: &HashMap<SongTypeAndPosition, usize>) -> Vec<FixReason> {
    let mut reasons = Vec::new();

    if song.name.trim().is_empty() {
        reasons.push(FixReason::BlankName);
    }
    if song.artist.trim().is_empty() {
        reasons.push(FixReason::BlankArtist);
    }
    if !song.has_valid_times() {
        reasons.push(FixReason::InvalidTimes);
    }
    match &song.song_type {
        None => reasons.push(FixReason::UnsetSongType),
        Some(song_type) if type_counts.get(song_type).copied().unwrap_or(0) > 1 => {
            reasons.push(FixReason::AmbiguousSongType)
        }
        Some(_) => {}
    }

    reasons
}
