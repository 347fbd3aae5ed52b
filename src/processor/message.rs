use std::path::PathBuf;

use crossbeam_channel::Sender;

use crate::{outside::TranscodeRequest, result::TranscodeError, types::Target};

/// One target of a song to produce at `output`
#[derive(Debug)]
pub struct TargetJob {
    pub target: Target,
    pub request: TranscodeRequest,
    pub output: PathBuf,
}

#[derive(Debug)]
pub struct SongJob {
    pub song_index: usize,
    pub song: String,
    pub targets: Vec<TargetJob>,
}

/// Every song of a show to process, in order. A show is only ever handled
/// by a single worker.
#[derive(Debug)]
pub struct ShowJob {
    pub show_index: usize,
    pub show_id: u32,
    pub directory: PathBuf,
    pub songs: Vec<SongJob>,
}

/// Results of the targets of one song.
///
/// The worker waits on `ack` before starting the next song of the show.
#[derive(Debug)]
pub struct SongOutcome {
    pub show_index: usize,
    pub show_id: u32,
    pub song_index: usize,
    pub song: String,
    pub results: Vec<(Target, Result<(), TranscodeError>)>,
    pub ack: Sender<()>,
}
