//! Opt-in tracing subscriber setup for binaries and integration tests.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default tracing subscriber.
///
/// Filter resolution order: `RUST_LOG` from the environment, falling back to
/// `info,docent=debug`. Idempotent: a second call is a no-op, so libraries
/// embedding docent can call it without fighting the host application.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,docent=debug"))
        .unwrap_or_default();

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init();
}
