// ABOUTME: Shared logging setup for keyprobe binaries
// ABOUTME: init() for interactive runs, init_quiet() when stdout is consumed by other tools

use tracing_subscriber::EnvFilter;

/// Standard logging to stderr. Default: INFO level, RUST_LOG override.
/// Used by the acceptance and lookup commands.
pub fn init() {
    init_with(tracing::Level::INFO);
}

/// Logging to stderr at WARN level, RUST_LOG override.
/// Used by commands whose stdout is piped (generate, fragments).
pub fn init_quiet() {
    init_with(tracing::Level::WARN);
}

fn init_with(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn exports_init() {
        let _ = super::init as fn();
    }

    #[test]
    fn exports_init_quiet() {
        let _ = super::init_quiet as fn();
    }
}
