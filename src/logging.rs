use std::str::FromStr;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::Targets,
    fmt::{
        format::{FormatEvent, FormatFields, Writer},
        FmtContext,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    Registry,
};

/// `2024-05-01 12:00:00,123 - INFO - span: message` lines.
pub struct LogFormatter {
    with_spans: bool,
}

impl LogFormatter {
    pub fn new(with_spans: bool) -> Self {
        Self { with_spans }
    }
}

impl<S, N> FormatEvent<S, N> for LogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;

        if self.with_spans {
            if let Some(scope) = ctx.event_scope() {
                for span in scope.from_root() {
                    write!(writer, "{}: ", span.name())?;
                }
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Installs the global subscriber for binaries. `LOG_LEVEL` (default `info`) sets the level of
/// this crate's events.
pub fn setup_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| Level::from_str(&level).ok())
        .unwrap_or(Level::INFO);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LogFormatter::new(level >= Level::DEBUG))
        .with_writer(std::io::stderr);

    Registry::default()
        .with(Targets::new().with_target("google_sheet_client", level))
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}
