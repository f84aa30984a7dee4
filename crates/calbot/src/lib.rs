//! Posts upcoming Google Calendar events to an IRC channel.
//!
//! Every `notify_interval` the worker fetches today's events and sends
//! `- <summary> (<start>) created by <creator>` for each event starting
//! before the next interval boundary.

pub mod calendar;
pub mod chat;
pub mod config;
pub mod error;
pub mod interval;
pub mod notifier;
pub mod window;
pub mod worker;

pub use config::Config;
pub use error::{CalbotError, Result};

/// Install the ring provider for rustls; harmless when already installed.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// fmt subscriber on stderr filtered by `RUST_LOG`, `info` when unset.
/// Stdout is left for the config template and `--dry-run` output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
