//! Tracing setup for the bot: plain-text lines on stdout and in an append-only log file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::Writer, fmt::time::FormatTime, fmt::writer::MakeWriterExt,
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Log file used when `LOG_FILE` is unset.
pub const DEFAULT_LOG_FILE: &str = "logs/digest-bot.log";

/// Filter used when `RUST_LOG` is unset or invalid. HTTP client internals are noisy at
/// `info` during long polling.
pub const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Opens `path` for appending, creating its directory first.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// `RUST_LOG` directives, or [`DEFAULT_LOG_FILTER`] when they are missing or unparsable.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber: `YYYY-MM-DD HH:MM:SS LEVEL target: message fields`,
/// teed to stdout and `log_file_path`, without ANSI colors. Load `.env` first so
/// `RUST_LOG` is visible.
pub fn init_tracing(log_file_path: &str) -> anyhow::Result<()> {
    let file = Arc::new(open_log_file(Path::new(log_file_path))?);
    let filter = log_filter(std::env::var("RUST_LOG").ok().as_deref());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout.and(file))
        .with_timer(LocalTime)
        .with_target(true)
        .with_ansi(false);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: The log file's directory is created and reopening appends.**
    #[test]
    fn test_open_log_file_creates_dir_and_appends() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("bot.log");
        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    /// **Test: Missing or invalid directives fall back to the default filter.**
    #[test]
    fn test_log_filter_fallback() {
        assert_eq!(log_filter(None).to_string(), EnvFilter::new(DEFAULT_LOG_FILTER).to_string());
        assert_eq!(
            log_filter(Some("digest_core=notalevel")).to_string(),
            EnvFilter::new(DEFAULT_LOG_FILTER).to_string()
        );
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
    }
}
