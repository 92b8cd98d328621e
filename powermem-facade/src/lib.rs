//! Memory Facade (C9, §4.9): the one crate every external caller depends
//! on. Exposes an async [`MemoryEngine`] and a [`BlockingMemoryEngine`]
//! wrapper over the same pipeline — router (C6), ingest (C7), retrieval
//! (C8), retention (C5), profile (C10), and the observability surface —
//! plus the `tracing-subscriber` initialization every other crate only logs
//! through (SPEC_FULL §10.2: this crate owns the subscriber).

mod blocking;
mod engine;
mod providers;

pub use blocking::BlockingMemoryEngine;
pub use engine::{AddRequest, MemoryEngine, SearchRequest};

use powermem_core::config::ObservabilityConfig;

/// Installs a global `tracing` subscriber driven by `RUST_LOG` (falling
/// back to `config.log_filter`) and, when `config.json_logs` is set, a
/// structured JSON writer instead of the default human-readable one.
/// Safe to call once per process; a second call is a logged no-op rather
/// than a panic, since library code embedding this facade shouldn't crash
/// a host process that already initialized its own subscriber.
pub fn init_tracing(config: &ObservabilityConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter.clone()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if config.json_logs {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if let Err(err) = result {
        tracing::debug!(error = %err, "tracing subscriber already initialized, skipping");
    }
}
