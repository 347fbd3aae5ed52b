use std::{
    fs,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::{
    io::sibling_tempfile,
    outside::Transcoder,
    result::TranscodeError,
};

use super::message::{ShowJob, SongOutcome, TargetJob};

/// Worker producing the songs of the shows it receives, one show at a time
#[derive(Debug)]
pub struct ShowActor {
    id: usize,
    transcoder: Arc<dyn Transcoder>,
    cancel: Arc<AtomicBool>,

    receive_channel: Option<Receiver<ShowJob>>,
    send_channel: Option<Sender<SongOutcome>>,
}

impl ShowActor {
    pub fn new(id: usize, transcoder: Arc<dyn Transcoder>, cancel: Arc<AtomicBool>) -> Self {
        Self {
            id,
            transcoder,
            cancel,
            receive_channel: None,
            send_channel: None,
        }
    }

    pub fn set_receive_channel(&mut self, channel: Receiver<ShowJob>) {
        self.receive_channel = Some(channel);
    }

    pub fn set_send_channel(&mut self, channel: Sender<SongOutcome>) {
        self.send_channel = Some(channel);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Process shows until the job channel is empty, the run is cancelled
    /// or nobody listens to the outcomes anymore
    pub fn run(mut self) {
        let (Some(receive_channel), Some(send_channel)) =
            (self.receive_channel.take(), self.send_channel.take())
        else {
            warn!("Worker {} started without its channels", self.id);
            return;
        };

        debug!("Actor started, waiting for a show");

        for ShowJob {
            show_index,
            show_id,
            directory,
            songs,
        } in receive_channel
        {
            debug!("Show {show_id} received with {} songs to process", songs.len());

            for song_job in songs {
                if self.is_cancelled() {
                    debug!("Run cancelled. Stopping the actor.");
                    return;
                }

                let mut results = Vec::with_capacity(song_job.targets.len());
                for target_job in song_job.targets {
                    let target = target_job.target;
                    info!("Producing {target} of '{}'", song_job.song);

                    let res = self.produce(&directory, &target_job);
                    if matches!(&res, Err(err) if err.is_cancelled()) {
                        debug!("Run cancelled during a transcode. Stopping the actor.");
                        return;
                    }
                    results.push((target, res));
                }

                let (ack, acked) = bounded(1);
                let outcome = SongOutcome {
                    show_index,
                    show_id,
                    song_index: song_job.song_index,
                    song: song_job.song,
                    results,
                    ack,
                };

                // Either failure means the run has been dropped
                if send_channel.send(outcome).is_err() || acked.recv().is_err() {
                    debug!("Outcome receiver gone. Stopping the actor.");
                    return;
                }
            }

            debug!("Show {show_id} completed. Waiting for next show");
        }

        debug!("All shows completed. Stopping the actor.");
    }

    /// Transcode into a tempfile next to the output, and move it in place
    /// only once complete. Nothing is left behind on failure.
    fn produce(&self, directory: &Path, job: &TargetJob) -> Result<(), TranscodeError> {
        let out_tmp = sibling_tempfile(directory, job.target.with_dot()).map_err(|source| {
            TranscodeError::Io {
                path: directory.to_path_buf(),
                source,
            }
        })?;

        self.transcoder
            .transcode(&job.request, out_tmp.path(), &self.cancel)?;

        let len = fs::metadata(out_tmp.path()).map_or(0, |metadata| metadata.len());
        if len == 0 {
            return Err(TranscodeError::MissingOutput(job.output.clone()));
        }

        out_tmp
            .persist(&job.output)
            .map_err(|err| TranscodeError::Io {
                path: job.output.clone(),
                source: err.error,
            })?;

        debug!("Created {}", job.output.display());
        Ok(())
    }
}
