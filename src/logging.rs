use miette::{IntoDiagnostic, Result, WrapErr};
use owo_colors::OwoColorize;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{format, FmtContext, FormatEvent, FormatFields},
    registry::LookupSpan,
    FmtSubscriber,
};

const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Initialize the logging system.
///
/// Must be called before any thread is spawned, as the local offset
/// cannot be read afterwards on some platforms.
pub fn init_logging(level: Level) -> Result<()> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let subscriber = FmtSubscriber::builder()
        .event_format(PrettyLogger { offset })
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

/// One line per event: local time, level, thread name, then the fields
struct PrettyLogger {
    offset: UtcOffset,
}

impl<S, N> FormatEvent<S, N> for PrettyLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let now = OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .time()
            .format(TIME_FORMAT)
            .map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("unnamed");

        if writer.has_ansi_escapes() {
            let level = match *metadata.level() {
                Level::ERROR => metadata.level().red().to_string(),
                Level::WARN => metadata.level().yellow().to_string(),
                Level::DEBUG | Level::TRACE => metadata.level().blue().to_string(),
                _ => metadata.level().green().to_string(),
            };

            write!(&mut writer, "{now} {level:>5} {} ", thread_name.yellow())?;
        } else {
            write!(&mut writer, "{now} {:>5} {thread_name} ", metadata.level())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
