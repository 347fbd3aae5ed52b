mod cli;
mod config;
mod gatherers;
mod io;
mod loader;
mod logging;
mod outside;
mod processor;
mod result;
mod types;

use std::{path::Path, sync::Arc, thread};

use clap::Parser;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use tracing::{info, warn};

use crate::{
    cli::{AddArgs, Args, Command, FixesArgs, ListArgs, ProcessArgs},
    config::Settings,
    gatherers::{AnimeNewsNetwork, Gatherer, Gatherers},
    loader::{JsonLoader, ShowLoader},
    logging::init_logging,
    outside::{attach_video_info, Ffmpeg, Ffprobe},
    processor::{
        export_fixes, FixEntry, ProcessOptions, SongProcessed, SongProcessor, TargetFailure,
    },
    types::Show,
};

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load(args.config.as_deref())
        .into_diagnostic()
        .wrap_err("Could not read the configuration")?;
    let level = match args.log_level {
        Some(level) => level,
        None => settings.level().map_err(|err| miette!(err))?,
    };
    init_logging(level)?;

    let loader = Arc::new(JsonLoader::new());

    match args.command {
        Command::Add(add) => run_add(&add, &settings, loader.as_ref()),
        Command::Fixes(fixes) => run_fixes(&fixes, loader.as_ref()),
        Command::Process(process) => run_process(&process, &settings, loader),
        Command::List(list) => run_list(&list, loader.as_ref()),
    }
}

/// Load every record under `dir`. Unreadable records are reported and skipped.
fn load_shows(loader: &dyn ShowLoader, dir: &Path) -> Vec<Show> {
    let mut shows = Vec::new();
    for res in loader.load_all(dir) {
        match res {
            Ok(show) => shows.push(show),
            Err(err) => warn!("Skipping record: {:?}", miette::Report::new(err)),
        }
    }

    info!("{} shows loaded from {}", shows.len(), dir.display());
    shows
}

fn run_add(add: &AddArgs, settings: &Settings, loader: &dyn ShowLoader) -> Result<()> {
    let ann = AnimeNewsNetwork::new()
        .into_diagnostic()
        .wrap_err("Could not create the HTTP client")?;
    let available: Vec<Box<dyn Gatherer>> = vec![Box::new(ann)];
    let gatherers = Gatherers::new(available);

    let name = add.gatherer.as_deref().unwrap_or(&settings.gatherer);
    let gatherer = gatherers.get(name).wrap_err_with(|| {
        let known: Vec<_> = gatherers.names().collect();
        format!("Known gatherers: {}", known.join(", "))
    })?;

    let mut show = gatherer.fetch(add.id, &add.gather_options())?;
    let path = loader.save_new(&add.dir, &mut show, add.save_options())?;

    println!("{show}: {} songs -> {}", show.songs.len(), path.display());
    Ok(())
}

fn run_fixes(fixes: &FixesArgs, loader: &dyn ShowLoader) -> Result<()> {
    let shows = load_shows(loader, &fixes.dir);
    let out = fixes.out.as_deref().unwrap_or(&fixes.dir);

    for report in export_fixes(out, &shows)? {
        let count = report.entries.len();
        match &report.path {
            Some(path) => println!("[{}] {count} fixes -> {}", report.show_id, path.display()),
            None => println!("[{}] {count} fixes, not written", report.show_id),
        }
        report.entries.iter().for_each(print_fix);
    }
    Ok(())
}

fn print_fix(entry: &FixEntry) {
    let reasons: Vec<_> = entry.reasons.iter().map(ToString::to_string).collect();
    println!("  {:>3} {}: {}", entry.song_index, entry.song, reasons.join(", "));
}

/// Check the external programs concurrently, as running them is not instantaneous
fn load_external_components(settings: &Settings) -> Result<(Ffmpeg, Ffprobe)> {
    thread::scope(|scope| -> Result<(Ffmpeg, Ffprobe)> {
        let ffmpeg = scope.spawn(|| Ffmpeg::new(settings.ffmpeg.as_str()));
        let ffprobe = scope.spawn(|| Ffprobe::new(settings.ffprobe.as_str()));

        let ffmpeg = ffmpeg
            .join()
            .map_err(|_| miette!("The ffmpeg check panicked"))??;
        let ffprobe = ffprobe
            .join()
            .map_err(|_| miette!("The ffprobe check panicked"))??;

        Ok((ffmpeg, ffprobe))
    })
}

fn run_process(process: &ProcessArgs, settings: &Settings, loader: Arc<JsonLoader>) -> Result<()> {
    let (ffmpeg, ffprobe) = load_external_components(settings)?;

    let mut shows = load_shows(loader.as_ref(), &process.dir);
    for show in &mut shows {
        attach_video_info(&ffprobe, show);
        info!("{show}");
    }

    let mut options = ProcessOptions {
        reprocess: process.reprocess(),
        ..Default::default()
    };
    if let Some(workers) = process.workers.map(usize::from).or(settings.workers) {
        options.workers = workers;
    }

    let processor = SongProcessor::new(Arc::new(ffmpeg), loader, options);
    let mut run = processor.process(&mut shows);

    let mut processed = 0;
    for event in &mut run {
        processed += 1;
        print_event(&event);
    }

    let failures: Vec<TargetFailure> = run.failures().to_vec();
    drop(run);

    for failure in &failures {
        println!("failed: {failure}");
    }
    info!("{processed} songs processed, {} targets failed", failures.len());

    if failures.is_empty() {
        Ok(())
    } else {
        Err(miette!("{} targets could not be produced", failures.len()))
    }
}

fn print_event(event: &SongProcessed) {
    println!("{event}");
    if let Some(err) = &event.save_error {
        println!("  could not save: {err}");
    }
}

fn run_list(list: &ListArgs, loader: &dyn ShowLoader) -> Result<()> {
    let shows = load_shows(loader, &list.dir);
    let terms = list.search_terms();
    let visibility = list.visibility();

    for show in shows.iter().filter(|show| terms.is_show_visible(show)) {
        println!("{show}");

        let songs = show
            .songs
            .iter()
            .enumerate()
            .filter(|(_, song)| terms.is_song_visible(song) && visibility.is_visible(song));
        for (index, song) in songs {
            let ignored = if song.should_ignore { " (ignored)" } else { "" };
            let times = match song.length() {
                Some(length) => format!("{} +{length}", song.start),
                None => "no times".to_owned(),
            };
            println!("  {index:>3} {song} [{times}] {}{ignored}", song.status);
        }
    }
    Ok(())
}
