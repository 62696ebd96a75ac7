//! Logging setup
//!
//! The engine only emits `tracing` events. Hosts that do not install their
//! own subscriber can call [`init`] once at startup.

/// Install a fmt subscriber filtered by `RUST_LOG`
///
/// Without `RUST_LOG` the filter is `reprise_core=info`, or
/// `reprise_core=debug` when `debug` is set. Returns `false` when a global
/// subscriber was already installed.
pub fn init(debug: bool) -> bool {
    let default_filter = if debug {
        "reprise_core=debug"
    } else {
        "reprise_core=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(true)
        .try_init()
        .is_ok()
}
