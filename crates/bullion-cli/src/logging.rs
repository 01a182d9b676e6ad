use std::env;
use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber; stdout carries only command output.
///
/// The filter comes from `BULLION_LOG`, then `RUST_LOG`, then `warn`.
/// `BULLION_LOG_FORMAT=json` switches to one JSON object per event.
pub fn init() {
    let filter = env::var("BULLION_LOG")
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));
    let json = env::var("BULLION_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(io::stderr))
            .try_init()
    };
    if let Err(error) = result {
        eprintln!("warning: logging disabled: {error}");
    }
}
