use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the global subscriber. `-e`/`--debug` logs to standard error;
/// otherwise logs go to a rolling, non-blocking file writer. The returned
/// guard must be held for the lifetime of the process — dropping it early
/// silently stops flushing buffered log lines.
pub fn init(debug: bool) -> Option<WorkerGuard> {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	if debug {
		tracing_subscriber::registry().with(env_filter).with(fmt::layer().with_writer(std::io::stderr)).init();
		None
	} else {
		let file_appender = tracing_appender::rolling::never(".", "objectsftpd.log");
		let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
		tracing_subscriber::registry()
			.with(env_filter)
			.with(fmt::layer().with_writer(non_blocking_writer).with_ansi(false))
			.init();
		Some(guard)
	}
}
