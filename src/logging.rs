use crate::config::LogConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
  filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const LOG_FILE_PREFIX: &str = "rmdex.log";

/// Install the global subscriber, writing to a daily rolling file in `dir`.
///
/// The terminal belongs to the UI, so nothing is logged to stdout or stderr.
/// `RUST_LOG` takes precedence over the configured level. Keep the returned
/// guard alive until exit or buffered lines are lost.
pub fn init(config: &LogConfig, dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.level));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialise logging: {}", e))?;

  Ok(guard)
}

/// Filter for the configured level; an unparsable level falls back to info.
///
/// Accepts a bare level (`debug`) or `target=level` directives. Every
/// directive must end in a level, so a typo is not taken for a target name.
fn level_filter(level: &str) -> EnvFilter {
  let valid = !level.trim().is_empty()
    && level.split(',').all(|directive| {
      directive
        .rsplit('=')
        .next()
        .is_some_and(|lvl| lvl.trim().parse::<LevelFilter>().is_ok())
    });
  if !valid {
    return EnvFilter::new("info");
  }
  EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
