//! Tracing setup for binaries and scripts embedding the engine.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the caller.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber honoring `RUST_LOG` (default `info`).
///
/// `json` switches to one JSON object per line. Calling this twice is a no-op.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
