use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::{AspectRatio, Song};

/// Intrinsic properties of a probed source video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub sar: Option<AspectRatio>,
    pub dar: Option<AspectRatio>,
}

impl Display for VideoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let or_na = |ratio: Option<AspectRatio>| ratio.map_or("N/A".to_owned(), |r| r.to_string());
        write!(
            f,
            "[{}x{}] [SAR: {}] [DAR: {}]",
            self.width,
            self.height,
            or_na(self.sar),
            or_na(self.dar)
        )
    }
}

/// One cataloged anime entry and its songs.
///
/// `directory` and `record_path` are not part of the record: they are
/// derived from where the record lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: u32,
    pub name: String,
    pub year: i32,
    /// Primary source video, relative to the directory
    #[serde(default)]
    pub source: Option<PathBuf>,
    #[serde(default)]
    pub songs: Vec<Song>,

    #[serde(skip)]
    pub directory: PathBuf,
    #[serde(skip)]
    pub record_path: Option<PathBuf>,
    #[serde(skip)]
    pub video_info: Option<VideoInfo>,
}

impl Show {
    pub fn new(id: u32, name: impl Into<String>, year: i32) -> Self {
        Self {
            id,
            name: name.into(),
            year,
            source: None,
            songs: Vec::new(),
            directory: PathBuf::new(),
            record_path: None,
            video_info: None,
        }
    }

    /// Resolve a path relative to the show directory.
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.directory.join(path)
    }

    /// Absolute path of the primary source video, if any
    pub fn source_path(&self) -> Option<PathBuf> {
        self.source.as_deref().map(|source| self.resolve(source))
    }

    /// Remove the show's own id from the songs `also_in` sets
    pub(crate) fn strip_self_references(&mut self) {
        let id = self.id;
        for song in &mut self.songs {
            song.also_in.remove(&id);
        }
    }
}

impl Display for Show {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] [{}] {}", self.year, self.id, self.name)?;
        if let Some(info) = &self.video_info {
            write!(f, " {info}")?;
        }
        Ok(())
    }
}
