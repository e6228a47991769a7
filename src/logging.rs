use std::env;
use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_ENV: &str = "IDLE_MONEY_LOG_LEVEL";

pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    let level = if level.is_empty() { "info" } else { level };
    format!("warn,idle_money={}", level.to_ascii_lowercase())
}

/// Stderr logging. `RUST_LOG` wins over `IDLE_MONEY_LOG_LEVEL` when set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(filter_directive(&level))
            .unwrap_or_else(|_| EnvFilter::new(filter_directive("info")))
    });

    // A second call (tests, embedding hosts) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
