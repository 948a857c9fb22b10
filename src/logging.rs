//! Diagnostics go to stderr through `tracing`, so they never end up in a
//! hosts file written to stdout.
use tracing_subscriber::EnvFilter;

/// The level used for a given number of `-v` flags.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, wins over
/// `verbosity`. Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn more_flags_more_logging() {
        let levels: Vec<_> = (0..5).map(default_directive).collect();
        assert_eq!(levels, ["warn", "info", "debug", "trace", "trace"]);
    }

    #[test]
    fn init_is_idempotent() {
        init(0);
        init(3);
    }
}
