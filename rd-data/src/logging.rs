use chrono::Local;
use std::io::{self, IsTerminal};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    registry::LookupSpan,
};

const DEFAULT_FILTER: &str = "info";

/// Local-time event formatter: timestamp, level, module, then fields.
///
/// Only warnings and errors are colored.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let level = *meta.level();

        write!(writer, "{} ", Local::now().format("%H:%M:%S%.3f"))?;
        match level {
            Level::ERROR | Level::WARN if writer.has_ansi_escapes() => {
                let color = if level == Level::ERROR { "31" } else { "33" };
                write!(writer, "\x1b[1;{color}m{level:>5}\x1b[0m ")?;
            }
            _ => write!(writer, "{level:>5} ")?,
        }
        if let Some(module) = meta.module_path() {
            write!(writer, "{module}: ")?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
fn make_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initializes logging to stderr. Call once at startup.
///
/// Output is colored when stderr is a terminal, so stdout stays clean for
/// reports. `RUST_LOG` overrides the `info` default; `verbose` lowers the
/// default to `debug`. A second call is a no-op.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { DEFAULT_FILTER };

    let _ = tracing_subscriber::fmt()
        .with_ansi(io::stderr().is_terminal())
        .event_format(LocalFmt)
        .with_env_filter(make_filter(default_directive))
        .with_writer(io::stderr)
        .try_init();
}
