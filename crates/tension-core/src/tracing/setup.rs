//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV;

static INIT: Once = Once::new();

/// Initialize the tracing/logging system with an `info` fallback.
///
/// Reads `TENSION_LOG` for per-module log levels.
/// Format: `TENSION_LOG=tension_analysis::tensions=debug,tension_analysis=info`
///
/// This function is idempotent: calling it multiple times is safe.
pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Like [`init_tracing`], with an explicit fallback directive used when
/// `TENSION_LOG` is unset or invalid.
pub fn init_tracing_with_default(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}
