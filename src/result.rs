use std::{path::PathBuf, process::ExitStatus};

use miette::Diagnostic;
use thiserror::Error;

/// Failure to inspect a source video. Never fatal to a batch: the show simply
/// goes on without video information.
#[derive(Debug, Error, Diagnostic)]
pub enum ProbeError {
    #[error("Source video {0} does not exist")]
    #[diagnostic(code(amqclip::probe::missing))]
    MissingSource(PathBuf),

    #[error(transparent)]
    #[diagnostic(code(amqclip::probe::command))]
    Command(#[from] CommandError),

    #[error("Could not parse the probe output for {path}: {reason}")]
    #[diagnostic(code(amqclip::probe::malformed))]
    Malformed { path: PathBuf, reason: String },
}

/// Failure to build a show from a remote catalog
#[derive(Debug, Error, Diagnostic)]
pub enum GatherError {
    #[error("No gatherer named '{0}'")]
    #[diagnostic(
        code(amqclip::gather::unknown),
        help("Gatherers are selected by their case-insensitive name, e.g. ANN")
    )]
    UnknownGatherer(String),

    #[error("{gatherer} request for show {id} failed")]
    #[diagnostic(code(amqclip::gather::request))]
    Request {
        gatherer: String,
        id: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("{gatherer} has no show with id {id}")]
    #[diagnostic(code(amqclip::gather::not_found))]
    NotFound { gatherer: String, id: u32 },

    #[error("Could not parse the {gatherer} response for show {id}: {reason}")]
    #[diagnostic(code(amqclip::gather::malformed))]
    Malformed {
        gatherer: String,
        id: u32,
        reason: String,
    },
}

/// Failure to read or write a show record
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("A record already exists at {0}")]
    #[diagnostic(
        code(amqclip::persistence::conflict),
        help("Allow overwriting or duplicating the record")
    )]
    Conflict(PathBuf),

    #[error("Show {0} has never been saved, it has no record path")]
    #[diagnostic(code(amqclip::persistence::not_saved))]
    NotSaved(u32),

    #[error("I/O error on {path}")]
    #[diagnostic(code(amqclip::persistence::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record {path}")]
    #[diagnostic(code(amqclip::persistence::malformed))]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| PersistenceError::Io { path, source }
    }
}

/// Failure of an external program
#[derive(Debug, Error, Diagnostic)]
pub enum CommandError {
    #[error("Could not run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did run but was not successful ({status}). Here is its stderr: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{0} was cancelled")]
    Cancelled(String),
}

/// Failure to produce one target of a song. Recorded per target, never fatal
/// to a processing run.
#[derive(Debug, Error, Diagnostic)]
pub enum TranscodeError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Transcode finished but {0} is missing or empty")]
    MissingOutput(PathBuf),

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranscodeError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranscodeError::Command(CommandError::Cancelled(_)))
    }
}
