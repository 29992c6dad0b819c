use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing on stderr so log lines stay out of the chat transcript.
///
/// Default level is `warn`; override via `RUST_LOG` (e.g. `RUST_LOG=shopchat=debug`).
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    tracing::debug!("Tracing initialized");
}
