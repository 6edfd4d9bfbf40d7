//! Utility modules

pub mod memory_storage;
pub mod validation;

pub use memory_storage::*;
pub use validation::*;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting this crate to `info`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("movements_core=info"));

        // Another subscriber may already be installed by the host application.
        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("movements-core tracing initialized");
        }
    });
}
