//! Logging for CC-Relay, via the `tracing` ecosystem.
//!
//! CC-Relay has no metrics surface of its own — there is nothing the dispatch engine emits
//! today that an exporter would carry beyond what structured log fields already capture — so
//! this crate covers only the `tracing-subscriber` half of the stack: an env-filter plus a
//! formatting layer, selectable between human-readable and JSON output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Held for the lifetime of the process; dropping it is harmless. It exists so call sites read
/// as `let _guard = telemetry::init(...)`, leaving room to slot a future exporter in behind the
/// same return type without changing every caller.
#[must_use = "dropping the guard immediately undoes nothing today, but keep it alive in case a future exporter needs the drop hook"]
pub struct TelemetryGuard(());

/// Initializes the global `tracing` subscriber.
///
/// `log_filter` is an `EnvFilter` directive string (e.g. `"info"`, `"cc_relay=debug,warn"`)
/// used as the default when `RUST_LOG` is unset. Output is JSON-formatted when
/// `CC_RELAY_LOG_FORMAT=json` is set in the environment, otherwise human-readable.
///
/// Safe to call more than once in a process (tests do); subsequent calls are no-ops rather
/// than panicking, since `tracing`'s global subscriber can only be installed once.
pub fn init(log_filter: &str) -> TelemetryGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter));

    let json = std::env::var("CC_RELAY_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        registry.with(fmt_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);
        registry.with(fmt_layer).try_init()
    };

    if let Err(err) = result {
        // Already initialized (e.g. a second call within the same test binary); the existing
        // subscriber keeps running, which is exactly what a repeat call should do.
        eprintln!("tracing subscriber already initialized: {err}");
    }

    TelemetryGuard(())
}
