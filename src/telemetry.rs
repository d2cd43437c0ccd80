//! Tracing setup.
//!
//! - LOG_LEVEL is an `EnvFilter` directive string, e.g. "debug" or
//!   "info,ielts_practice=debug,exercise=debug,tower_http=info".
//! - LOG_FORMAT=json switches to structured output; anything else is the
//!   human-readable fmt layer.
//!
//! Targets, files and line numbers are always printed. Per-request spans come
//! from the router's `TraceLayer`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,ielts_practice=debug,tower_http=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders are different types, so each branch installs its own.
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
