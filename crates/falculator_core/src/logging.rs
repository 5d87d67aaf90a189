//! Structured, level-filtered logging.
//!
//! Every component logs through `tracing` with `id`/`name` fields. The
//! simulator additionally installs a [`DebugLogger`] for the duration of
//! a run: a thread-scoped `fmt` sink filtered at the config's log level,
//! released on every exit path (including unwinds) when the guard drops.

use std::fmt;

use tracing::level_filters::LevelFilter;
use tracing::subscriber::DefaultGuard;

use crate::model::ids::ItemId;
use crate::serde_util::named_enum;

named_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
    pub enum LogLevel {
        Debug = 0,
        Info = 1,
        #[default]
        Warn = 2,
        Error = 3,
    }
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Scoped log sink held for the lifetime of a simulation run.
pub struct DebugLogger {
    _guard: DefaultGuard,
}

impl DebugLogger {
    /// Install a level-filtered sink as the thread's default subscriber.
    /// If the embedding application already set a global subscriber, the
    /// scoped default shadows it only on this thread and only until the
    /// guard drops.
    pub fn scoped(level: LogLevel) -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level.as_filter())
            .with_target(false)
            .with_ansi(false)
            .finish();
        Self {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}

impl fmt::Debug for DebugLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugLogger").finish_non_exhaustive()
    }
}

/// Single structured entry point for collaborators that do not speak
/// `tracing` macros directly (GUI, CLI shells).
pub fn log(level: LogLevel, id: ItemId, name: &str, message: &str) {
    match level {
        LogLevel::Debug => tracing::debug!(%id, name, "{message}"),
        LogLevel::Info => tracing::info!(%id, name, "{message}"),
        LogLevel::Warn => tracing::warn!(%id, name, "{message}"),
        LogLevel::Error => tracing::error!(%id, name, "{message}"),
    }
}
