use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::{bounded, unbounded, Receiver};
use tracing::{debug, error, info, warn};

use crate::{
    loader::ShowLoader,
    outside::Transcoder,
    result::{PersistenceError, TranscodeError},
    types::{Show, Status, Target},
};

use super::{
    actor::ShowActor,
    message::{ShowJob, SongOutcome},
};

/// A target that could not be produced
#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub show_id: u32,
    pub song_index: usize,
    pub song: String,
    pub target: Target,
    pub error: Arc<TranscodeError>,
}

impl Display for TargetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {} ({}): {}",
            self.show_id, self.song_index, self.song, self.target, self.error
        )
    }
}

/// Emitted once per eligible song, after its status has been updated and
/// its show saved
#[derive(Debug)]
pub struct SongProcessed {
    pub show_id: u32,
    pub song_index: usize,
    pub song: String,
    /// Targets produced by this run
    pub produced: Vec<Target>,
    pub failures: Vec<TargetFailure>,
    pub status: Status,
    /// Set when the status changed but the record could not be saved
    pub save_error: Option<PersistenceError>,
}

impl Display for SongProcessed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{}] {} -> {}",
            self.show_id, self.song_index, self.song, self.status
        )?;
        if !self.produced.is_empty() {
            let produced: Vec<_> = self.produced.iter().map(ToString::to_string).collect();
            write!(f, " (+{})", produced.join(", "))?;
        }
        if !self.failures.is_empty() {
            write!(f, " ({} failed)", self.failures.len())?;
        }
        Ok(())
    }
}

/// A lazy processing run over a set of shows.
///
/// Workers are started on the first call to [`Iterator::next`]. Dropping the
/// run cancels in-flight transcodes and waits for the workers to stop.
pub struct ProcessRun<'a> {
    shows: &'a mut [Show],
    transcoder: Arc<dyn Transcoder>,
    loader: Arc<dyn ShowLoader>,
    workers: usize,
    cancel: Arc<AtomicBool>,

    pending: Option<Vec<ShowJob>>,
    outcomes: Option<Receiver<SongOutcome>>,
    handles: Vec<JoinHandle<()>>,
    failures: Vec<TargetFailure>,
}

impl<'a> ProcessRun<'a> {
    pub(super) fn new(
        shows: &'a mut [Show],
        jobs: Vec<ShowJob>,
        transcoder: Arc<dyn Transcoder>,
        loader: Arc<dyn ShowLoader>,
        workers: usize,
    ) -> Self {
        Self {
            shows,
            transcoder,
            loader,
            workers,
            cancel: Arc::new(AtomicBool::new(false)),
            pending: Some(jobs),
            outcomes: None,
            handles: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Every failure seen so far, in the order they were reported
    pub fn failures(&self) -> &[TargetFailure] {
        &self.failures
    }

    fn start(&mut self, jobs: Vec<ShowJob>) {
        if jobs.is_empty() {
            debug!("Nothing to process");
            return;
        }

        let workers = self.workers.clamp(1, jobs.len());
        info!("Processing {} shows with {workers} workers", jobs.len());

        let (input, receive) = unbounded();
        for job in jobs {
            // The receiver is alive until the end of this function
            let _ = input.send(job);
        }
        drop(input);

        // Rendezvous: a song outcome is handed over only when consumed
        let (send, output) = bounded(0);

        for id in 0..workers {
            let mut actor = ShowActor::new(id, self.transcoder.clone(), self.cancel.clone());
            actor.set_receive_channel(receive.clone());
            actor.set_send_channel(send.clone());

            match thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || actor.run())
            {
                Ok(handle) => self.handles.push(handle),
                Err(err) => error!("Could not start worker {id}: {err}"),
            }
        }

        self.outcomes = Some(output);
    }

    fn apply(&mut self, outcome: SongOutcome) -> SongProcessed {
        let SongOutcome {
            show_index,
            show_id,
            song_index,
            song: song_name,
            results,
            ack,
        } = outcome;

        let show = &mut self.shows[show_index];
        let song = &mut show.songs[song_index];
        let before = song.status;

        let mut produced = Vec::new();
        let mut failures = Vec::new();
        for (target, res) in results {
            match res {
                Ok(()) => {
                    song.status |= target.status();
                    produced.push(target);
                }
                Err(err) => {
                    error!("Could not produce {target} of '{song_name}': {err}");
                    failures.push(TargetFailure {
                        show_id,
                        song_index,
                        song: song_name.clone(),
                        target,
                        error: Arc::new(err),
                    });
                }
            }
        }

        if song.status != before {
            song.status |= Status::SUBMITTED;
        }
        let status = song.status;

        let save_error = if status != before {
            self.loader.save(show).err()
        } else {
            None
        };
        if let Some(err) = &save_error {
            warn!("Could not save show {show_id}: {err}");
        }

        // The worker may now go on with the next song of this show
        let _ = ack.send(());

        self.failures.extend(failures.iter().cloned());
        SongProcessed {
            show_id,
            song_index,
            song: song_name,
            produced,
            failures,
            status,
            save_error,
        }
    }
}

impl Iterator for ProcessRun<'_> {
    type Item = SongProcessed;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(jobs) = self.pending.take() {
            self.start(jobs);
        }

        let outcome = self.outcomes.as_ref()?.recv().ok()?;
        Some(self.apply(outcome))
    }
}

impl Drop for ProcessRun<'_> {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        // Workers blocked on sending an outcome stop as well
        self.outcomes.take();

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                error!("A worker panicked");
            }
        }
    }
}
