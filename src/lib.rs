pub mod archetype;
pub mod config;
pub mod decisions;
pub mod extract;
pub mod fight_plan;
pub mod http_client;
pub mod metrics;
pub mod names;
pub mod persist;
pub mod record;
pub mod roster;
pub mod runner;
pub mod scout;
pub mod tactics;
pub mod training;
pub mod transport;

use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber; `RUST_LOG` overrides the default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
