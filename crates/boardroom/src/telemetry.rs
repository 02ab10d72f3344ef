//! Tracing bootstrap for binaries that embed the lobby.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info,boardroom_room=debug"`).
///
/// Returns `false` if a global subscriber was already installed; the
/// existing one is kept. Libraries never call this; binaries and tests do.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_second_call_keeps_first() {
        let _ = init_tracing("warn");
        assert!(!init_tracing("debug"));
    }
}
