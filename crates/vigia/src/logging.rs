//! Process-wide `tracing` subscriber.
//!
//! Library code only emits through `tracing` macros; binaries call [`init`]
//! once. Logs go to stderr so a JSON report on stdout stays parseable.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

static INIT: OnceLock<bool> = OnceLock::new();

/// Default filter for a verbosity level: 0 = errors only, 1 = warnings
/// (the CLI default), 2 = info, 3 = debug, anything higher = trace
#[must_use]
pub const fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides
/// `verbosity`. Later calls are no-ops; returns whether this process's
/// subscriber is the one vigia installed.
pub fn init(verbosity: u8, json: bool) -> bool {
    *INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));
        let installed = if json {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))
        } else {
            let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))
        };
        installed.is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for(0), "error");
        assert_eq!(level_for(1), "warn");
        assert_eq!(level_for(3), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_init_is_idempotent() {
        let first = init(2, false);
        assert_eq!(init(4, true), first);
        tracing::info!("logging initialised");
    }
}
