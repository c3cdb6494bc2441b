//! Tracing/logging bootstrap for the console app.

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,workouts_console=debug,client_http=debug";

/// Install the global subscriber.
///
/// Filter precedence: `RUST_LOG`, then `WORKOUTS_CONSOLE_LOG`, then
/// `WORKOUTS_LOG`, then the built-in default. Unparseable values fall through.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_names(true)
        .with_env_filter(filter_from_env())
        .try_init();
}

fn filter_from_env() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    for key in ["WORKOUTS_CONSOLE_LOG", "WORKOUTS_LOG"] {
        if let Some(value) = env::var(key).ok().filter(|v| !v.trim().is_empty())
            && let Ok(filter) = EnvFilter::try_new(value)
        {
            return filter;
        }
    }

    EnvFilter::new(DEFAULT_FILTER)
}
