use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::{
    gatherers::GatherOptions,
    loader::SaveNewOptions,
    types::{SearchTerms, SongVisibility, Status, Target},
};

macro_rules! arg_env {
    ($v:literal) => {
        concat!("AMQCLIP_", $v)
    };
}

/// Catalog anime shows and their songs, then cut the songs out of the show
/// videos into audio and video clips.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Path to a TOML configuration file.
    /// Defaults to `amqclip.toml` in the working directory, if it exists.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Maximum level of the displayed logs, overriding the configuration
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the record of a new show out of a remote catalog
    Add(AddArgs),
    /// Write a report of the songs to fix for every show
    Fixes(FixesArgs),
    /// Produce the missing clips of every show
    Process(ProcessArgs),
    /// Print the shows and their songs
    List(ListArgs),
}

#[derive(ClapArgs, Debug)]
pub struct AddArgs {
    /// Base directory of the show records
    #[arg(long, env = arg_env!("DIR"))]
    pub dir: PathBuf,

    /// Id of the show in the catalog
    #[arg(long)]
    pub id: u32,

    /// Catalog to query, overriding the configuration
    #[arg(long)]
    pub gatherer: Option<String>,

    /// Do not keep the opening themes
    #[arg(long)]
    pub no_openings: bool,

    /// Do not keep the ending themes
    #[arg(long)]
    pub no_endings: bool,

    /// Do not keep the insert songs
    #[arg(long)]
    pub no_inserts: bool,

    /// Do not keep the songs the catalog does not classify
    #[arg(long)]
    pub no_songs: bool,

    /// Replace an existing record of the show
    #[arg(long)]
    pub overwrite: bool,

    /// Fail instead of creating a numbered duplicate when a record exists
    #[arg(long, conflicts_with = "overwrite")]
    pub no_duplicate: bool,

    /// Put the record directly in `--dir` instead of a directory named
    /// after the show
    #[arg(long)]
    pub no_show_dir: bool,
}

impl AddArgs {
    pub fn gather_options(&self) -> GatherOptions {
        GatherOptions {
            include_songs: !self.no_songs,
            include_openings: !self.no_openings,
            include_endings: !self.no_endings,
            include_inserts: !self.no_inserts,
        }
    }

    pub fn save_options(&self) -> SaveNewOptions {
        SaveNewOptions {
            allow_overwrite: self.overwrite,
            create_duplicate_on_collision: !self.no_duplicate,
            add_show_name_directory: !self.no_show_dir,
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct FixesArgs {
    /// Base directory of the show records
    #[arg(long, env = arg_env!("DIR"))]
    pub dir: PathBuf,

    /// Where to write the reports. Defaults to `--dir`
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ProcessArgs {
    /// Base directory of the show records
    #[arg(long, env = arg_env!("DIR"))]
    pub dir: PathBuf,

    /// Maximum number of shows processed at the same time,
    /// overriding the configuration
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Produce these targets again even if they already exist
    #[arg(long, value_enum, value_delimiter = ',')]
    pub reprocess: Vec<Target>,
}

impl ProcessArgs {
    pub fn reprocess(&self) -> Status {
        Target::statuses(&self.reprocess)
    }
}

#[derive(ClapArgs, Debug)]
pub struct ListArgs {
    /// Base directory of the show records
    #[arg(long, env = arg_env!("DIR"))]
    pub dir: PathBuf,

    /// Only the shows whose name contains this
    #[arg(long)]
    pub anime: Option<String>,

    /// Only the songs whose artist contains this
    #[arg(long)]
    pub artist: Option<String>,

    /// Only the songs whose name contains this
    #[arg(long)]
    pub song: Option<String>,

    #[arg(long)]
    pub hide_completed: bool,

    #[arg(long)]
    pub hide_ignored: bool,

    #[arg(long)]
    pub hide_unsubmitted: bool,

    /// Hide the songs that only miss these targets
    #[arg(long, value_enum, value_delimiter = ',')]
    pub hide_missing: Vec<Target>,
}

impl ListArgs {
    pub fn search_terms(&self) -> SearchTerms {
        SearchTerms {
            anime: self.anime.clone(),
            artist: self.artist.clone(),
            song: self.song.clone(),
        }
    }

    pub fn visibility(&self) -> SongVisibility {
        SongVisibility {
            show_ignored: !self.hide_ignored,
            show_unsubmitted: !self.hide_unsubmitted,
            show_completed: !self.hide_completed,
            show_missing_mp3: !self.hide_missing.contains(&Target::Mp3),
            show_missing_480: !self.hide_missing.contains(&Target::Res480),
            show_missing_720: !self.hide_missing.contains(&Target::Res720),
        }
    }
}
