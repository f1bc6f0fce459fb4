//! Diagnostic output via `tracing`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a stderr subscriber filtered at `level`. `RUST_LOG` wins when set.
///
/// Fails if a global subscriber is already installed.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact(),
    );

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(())
}
