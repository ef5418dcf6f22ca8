//! Logging setup for the plugin binary.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing once for the process.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Output goes to
/// stderr so stdout stays free for the port announcement.
pub fn init(default_level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
