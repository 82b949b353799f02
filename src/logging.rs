//! Logging bootstrap.
//!
//! Lifecycle events across the crate carry their context as structured
//! fields (`game_code`, `session_id`, `round_number`, `team_name`) rather
//! than message text, so the JSON format keeps them queryable. Both sinks
//! share one format helper; the whole stack is composed as boxed layers so
//! the file sink can be added without duplicating the console setup.

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging for the process.
///
/// Console output is always on; a rolling file appender is added when
/// `enable_file_logging` is set, falling back to console-only if the log
/// directory cannot be created. Level resolution: config `logging.level`,
/// then `RUST_LOG`, then "info".
pub fn init_with_config(cfg: &LoggingConfig) {
    let mut layers: Vec<BoxedLayer> = vec![level_filter(cfg).boxed()];
    layers.push(format_layer(cfg.format, std::io::stdout, true));

    if cfg.enable_file_logging {
        match file_writer(cfg) {
            Ok(writer) => layers.push(format_layer(cfg.format, writer, false)),
            Err(error) => eprintln!("File logging disabled: {error}"),
        }
    }

    // try_init: tests and repeated embedders may already hold a subscriber.
    let _ = tracing_subscriber::registry().with(layers).try_init();
}

fn level_filter(cfg: &LoggingConfig) -> EnvFilter {
    match &cfg.level {
        Some(level) => EnvFilter::new(level.as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let base = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(writer);

    match format {
        // JSON flattens the structured fields for log search.
        LogFormat::Json => base.json().with_ansi(false).boxed(),
        LogFormat::Text => base.with_ansi(ansi).boxed(),
    }
}

fn file_writer(
    cfg: &LoggingConfig,
) -> Result<tracing_appender::non_blocking::NonBlocking, String> {
    let rotation = match cfg.rotation.to_lowercase().as_str() {
        "hourly" => tracing_appender::rolling::Rotation::HOURLY,
        "never" => tracing_appender::rolling::Rotation::NEVER,
        _ => tracing_appender::rolling::Rotation::DAILY,
    };

    std::fs::create_dir_all(&cfg.dir)
        .map_err(|e| format!("could not create log directory '{}': {e}", cfg.dir))?;

    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &cfg.dir, &cfg.filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // The guard flushes buffered lines on drop; pin it for the process
    // lifetime so shutdown does not lose the tail of the log.
    let _leaked: &'static _ = Box::leak(Box::new(guard));

    Ok(writer)
}
