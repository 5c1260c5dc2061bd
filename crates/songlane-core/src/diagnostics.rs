use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{Span, info, info_span, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::{config::DiagnosticsConfig, song::Song};

/// Keeps the non-blocking file writer alive; logs flush when it drops.
pub struct TelemetryGuard {
    pub session_id: Uuid,
    pub log_file: PathBuf,
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber with default diagnostics settings.
pub fn init_tracing(log_dir: impl AsRef<Path>) -> anyhow::Result<TelemetryGuard> {
    init_tracing_from_config(log_dir, &DiagnosticsConfig::default())
}

/// Installs an `EnvFilter` registry with a JSON file layer and, unless
/// `stdout_logs` is off, a compact stdout layer. `RUST_LOG` wins over the
/// configured filter. A second call keeps the first subscriber and only
/// opens a new log file.
pub fn init_tracing_from_config(
    log_dir: impl AsRef<Path>,
    config: &DiagnosticsConfig,
) -> anyhow::Result<TelemetryGuard> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let session_id = Uuid::new_v4();
    let file_name = log_file_name(&config.trace_file_prefix, Utc::now());
    let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.rust_log_filter));

    let stdout_layer = config.stdout_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_thread_ids(true)
            .with_target(true)
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(file_writer);

    if let Err(error) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
    {
        warn!(?error, "global tracing subscriber already initialized");
    } else {
        info!(
            %session_id,
            filter = %config.rust_log_filter,
            file = %file_name,
            "tracing initialized"
        );
    }

    Ok(TelemetryGuard {
        session_id,
        log_file: log_dir.join(file_name),
        _file_guard: file_guard,
    })
}

/// `<prefix>-<UTC timestamp>.log`, sortable by session start.
#[must_use]
pub fn log_file_name(prefix: &str, started_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.log", started_at.format("%Y%m%d-%H%M%S"))
}

/// Span that tags events with the song being worked on, so a JSON log of a
/// session can be split per document.
#[must_use]
pub fn song_span(song: &Song) -> Span {
    info_span!(
        "song",
        song_id = %song.id(),
        tracks = song.track_count(),
        ppq = song.ppq()
    )
}
