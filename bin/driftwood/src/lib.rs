//! Driftwood CLI Library
//!
//! Command implementations and the development-server core for the
//! Driftwood static site generator.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, serve, new, check)
//! - [`server`] - Stoppable preview HTTP server
//! - [`watch`] - The watch-rebuild-serve loop

pub mod cmd;
pub mod server;
pub mod watch;

// Re-export core types for convenience
pub use driftwood_core::{Config, Page};
pub use driftwood_generator::{BuildStats, Builder, Renderer};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
