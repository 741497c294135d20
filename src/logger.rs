//! Logging configuration

use std::sync::LazyLock;
use tracing_subscriber::{
    fmt, fmt::time::ChronoLocal, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static HOSTNAME: LazyLock<String> = LazyLock::new(|| {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
});

/// Output layout for the simulation binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Detailed,
    /// Requires the `json` feature; falls back to compact otherwise
    Json,
}

/// Install the global subscriber for `format`.
pub fn init(format: LogFormat) {
    match format {
        LogFormat::Compact => init_logger(),
        LogFormat::Detailed => init_logger_detailed(),
        #[cfg(feature = "json")]
        LogFormat::Json => init_logger_json(),
        #[cfg(not(feature = "json"))]
        LogFormat::Json => {
            init_logger();
            tracing::warn!("Built without the `json` feature, using compact logs");
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Resident memory of this process, e.g. `12.5M`.
pub fn get_memory_usage() -> String {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                return format!("{:.1}M", kb / 1024.0);
            }
        }
    }

    let pid = sysinfo::Pid::from_u32(std::process::id());
    let mut system = sysinfo::System::new();
    system.refresh_process(pid);
    match system.process(pid) {
        Some(process) => format!("{:.1}M", process.memory() as f64 / (1024.0 * 1024.0)),
        None => "N/A".to_string(),
    }
}

pub fn get_hostname() -> &'static str {
    &*HOSTNAME
}

pub fn init_logger() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::rfc_3339())
                .with_target(false)
                .with_level(true)
                .with_ansi(true)
                .compact(),
        )
        .init();

    tracing::debug!("Logger initialized");
}

pub fn init_logger_detailed() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::rfc_3339())
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .with_ansi(true)
                .compact(),
        )
        .init();

    tracing::info!(
        hostname = %get_hostname(),
        memory = %get_memory_usage(),
        "Logger initialized (detailed format)"
    );
}

#[cfg(feature = "json")]
pub fn init_logger_json() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .init();

    tracing::info!("Logger initialized (JSON format)");
}

#[cfg(test)]
pub fn init_test_logger() {
    use tracing_subscriber::fmt::TestWriter;

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")))
        .with(
            fmt::layer()
                .with_writer(TestWriter::default())
                .with_target(false)
                .with_ansi(false)
                .compact(),
        )
        .try_init();
}

/// Log with hostname and memory attached, e.g.
/// `log_with_context!(info, rounds = 15, "Simulation finished")`.
#[macro_export]
macro_rules! log_with_context {
    ($level:ident, $($arg:tt)*) => {
        {
            let hostname = $crate::logger::get_hostname();
            let memory = $crate::logger::get_memory_usage();
            tracing::$level!(
                hostname = %hostname,
                memory = %memory,
                $($arg)*
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_is_never_empty() {
        assert!(!get_hostname().is_empty());
    }

    #[test]
    fn test_memory_usage_format() {
        let memory = get_memory_usage();
        assert!(memory == "N/A" || memory.ends_with('M'), "unexpected {}", memory);
    }

    #[test]
    fn test_log_with_context_expands() {
        init_test_logger();
        log_with_context!(debug, round = 3, "context macro smoke test");
    }
}
