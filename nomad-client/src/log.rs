use std::{backtrace::Backtrace, fs::File, path::Path, sync::OnceLock};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static TRACER: OnceLock<()> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub const LOG_FILE_NAME: &str = "nomad-tui.log";
pub const LOG_ENV: &str = "NOMAD_TUI_LOG";

/// Installs the file logger. Never writes to the terminal.
pub fn setup_logger(log_dir: &Path) -> std::io::Result<()> {
    if TRACER.get().is_some() {
        return Ok(());
    }
    std::fs::create_dir_all(log_dir)?;
    let file = File::create(log_dir.join(LOG_FILE_NAME))?;

    TRACER.get_or_init(|| {
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);

        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        let file_layer = fmt::layer()
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_writer)
            .with_filter(filter);

        LOG_GUARD.set(guard).ok();

        tracing_subscriber::registry().with(file_layer).try_init().ok();
    });

    Ok(())
}

/// Logs panics with a backtrace and restores the terminal before the default hook prints.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let backtrace = Backtrace::force_capture();
        tracing::error!(target: "panic", "{info}\n{backtrace}");
        crate::ui::restore_terminal();
        default_hook(info);
    }));
}
