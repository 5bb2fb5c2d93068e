use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Builds the dispatcher used for a run.
///
/// Lines carry a timestamp, the target (logger name), the level and the
/// message. `RUST_LOG` overrides the default filter. The dispatcher is not
/// installed globally; callers scope it with `tracing::dispatcher::set_default`.
pub fn dispatcher<W>(writer: W) -> Dispatch
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    Dispatch::new(subscriber)
}

/// Dispatcher writing to standard output.
pub fn stdout_dispatcher() -> Dispatch {
    dispatcher(std::io::stdout)
}
