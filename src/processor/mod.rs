mod actor;
mod fixes;
mod message;
mod run;

pub use fixes::{find_fixes, FixEntry, FixReport};
pub use run::{ProcessRun, SongProcessed, TargetFailure};

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{debug, info, warn};

use crate::{
    io::{sanitize_file_name, write_atomically},
    loader::ShowLoader,
    outside::{TranscodeRequest, Transcoder},
    result::PersistenceError,
    types::{Show, Song, Status, Target},
};

use message::{ShowJob, SongJob, TargetJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Maximum number of shows processed at the same time
    pub workers: usize,
    /// Targets produced again even when the song already has them
    pub reprocess: Status,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism().map_or(1, |n| n.get()),
            reprocess: Status::empty(),
        }
    }
}

/// Where the artifact of a song target lives:
/// `<show dir>/<Artist> - <Name> [<Type> <Position>]<target suffix>`
pub fn artifact_path(show: &Show, song: &Song, target: Target) -> PathBuf {
    let stem = sanitize_file_name(&song.full_name());
    show.directory.join(format!("{stem}{}", target.with_dot()))
}

/// Write one `<id>.fixes.json` report per show in `directory`, empty
/// reports included.
///
/// A report that cannot be written is logged and returned with no path.
/// Only failing to create `directory` is an error.
pub fn export_fixes(
    directory: &Path,
    shows: &[Show],
) -> Result<Vec<FixReport>, PersistenceError> {
    std::fs::create_dir_all(directory).map_err(PersistenceError::io(directory))?;

    let reports = shows
        .iter()
        .map(|show| {
            let entries = find_fixes(show);
            let path = directory.join(format!("{}.fixes.json", show.id));

            let written = serde_json::to_vec_pretty(&entries)
                .map_err(|err| err.to_string())
                .and_then(|bytes| {
                    write_atomically(&path, &bytes, true).map_err(|err| err.to_string())
                });

            let path = match written {
                Ok(()) => {
                    debug!("{} fixes for show {} in {}", entries.len(), show.id, path.display());
                    Some(path)
                }
                Err(err) => {
                    warn!("Could not write fixes of show {}: {err}", show.id);
                    None
                }
            };

            FixReport {
                show_id: show.id,
                path,
                entries,
            }
        })
        .collect::<Vec<_>>();

    let total: usize = reports.iter().map(|report| report.entries.len()).sum();
    info!("{total} songs to fix over {} shows", reports.len());
    Ok(reports)
}

/// Absolute path of the clean audio of the song, when it exists
fn clean_audio(show: &Show, song: &Song) -> Option<PathBuf> {
    song.clean_path
        .as_deref()
        .map(|path| show.resolve(path))
        .filter(|path| path.is_file())
}

/// Turn the songs of loaded shows into artifacts
pub struct SongProcessor {
    transcoder: Arc<dyn Transcoder>,
    loader: Arc<dyn ShowLoader>,
    options: ProcessOptions,
}

impl SongProcessor {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        loader: Arc<dyn ShowLoader>,
        options: ProcessOptions,
    ) -> Self {
        Self {
            transcoder,
            loader,
            options,
        }
    }

    /// Produce every missing target of the eligible songs.
    ///
    /// A song is eligible when it is not ignored, has valid times and has
    /// something to cut from: the show source video, or its clean audio for
    /// the mp3 target. Inputs are only considered when their file exists.
    /// Each eligible song yields exactly one event, even when there is
    /// nothing left to produce.
    pub fn process<'a>(&self, shows: &'a mut [Show]) -> ProcessRun<'a> {
        let jobs = shows
            .iter()
            .enumerate()
            .filter_map(|(show_index, show)| self.show_job(show_index, show))
            .collect();

        ProcessRun::new(
            shows,
            jobs,
            self.transcoder.clone(),
            self.loader.clone(),
            self.options.workers,
        )
    }

    fn show_job(&self, show_index: usize, show: &Show) -> Option<ShowJob> {
        let source = show.source_path().filter(|source| {
            let exists = source.is_file();
            if !exists {
                warn!("Source video of show {} is missing: {}", show.id, source.display());
            }
            exists
        });

        let songs: Vec<_> = show
            .songs
            .iter()
            .enumerate()
            .filter(|(_, song)| {
                let eligible = !song.should_ignore
                    && song.has_valid_times()
                    && (source.is_some() || clean_audio(show, song).is_some());
                if !eligible {
                    debug!("Skipping '{song}' of show {}", show.id);
                }
                eligible
            })
            .map(|(song_index, song)| SongJob {
                song_index,
                song: song.full_name(),
                targets: self.target_jobs(show, song, source.as_deref()),
            })
            .collect();

        (!songs.is_empty()).then(|| ShowJob {
            show_index,
            show_id: show.id,
            directory: show.directory.clone(),
            songs,
        })
    }

    fn target_jobs(&self, show: &Show, song: &Song, source: Option<&Path>) -> Vec<TargetJob> {
        let clean = clean_audio(show, song);

        Target::ALL
            .into_iter()
            .filter(|target| {
                song.status.is_missing(target.status())
                    || self.options.reprocess.contains(target.status())
            })
            .filter_map(|target| {
                // The clean audio replaces the source audio for mp3 only
                let (input, audio_track) = match (&clean, target.is_audio_only(), source) {
                    (Some(clean), true, _) => (clean.clone(), 0),
                    (_, _, Some(source)) => (source.to_path_buf(), song.override_audio_track),
                    _ => {
                        debug!("No input for {target} of '{song}'");
                        return None;
                    }
                };

                Some(TargetJob {
                    target,
                    request: TranscodeRequest {
                        input,
                        target,
                        start: song.start,
                        end: song.end,
                        audio_track,
                        video_track: song.override_video_track,
                        aspect_ratio: song.override_aspect_ratio,
                        volume: song.volume_modifier,
                    },
                    output: artifact_path(show, song, target),
                })
            })
            .collect()
    }
}
