use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn rotating_file_writer(app_name: &'static str, dir: &Path) -> std::io::Result<BoxMakeWriter> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, format!("{app_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = LOG_GUARD.set(guard);
    Ok(BoxMakeWriter::new(non_blocking))
}

/// Installs the global subscriber. `RUST_LOG` filters, default `info`.
///
/// With `log_dir` set, output goes to `<log_dir>/<app>.log` rotated daily;
/// otherwise to stderr, which keeps stdout free for the stdio transport.
pub fn init_tracing_subscriber(app_name: &'static str, log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);

    match log_dir.map(|dir| (dir, rotating_file_writer(app_name, dir))) {
        Some((_, Ok(writer))) => {
            let _ = builder.with_writer(writer).with_ansi(false).try_init();
        }
        Some((dir, Err(err))) => {
            let _ = builder.with_writer(std::io::stderr).try_init();
            tracing::warn!(dir = %dir.display(), error = %err, "cannot create log dir, logging to stderr");
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
