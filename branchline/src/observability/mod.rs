//! Tracing setup for host applications.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber with env-filter support.
///
/// Directives come from `filter` when given, otherwise from `RUST_LOG`. Safe
/// to call more than once; later calls are no-ops.
pub fn init_tracing(filter: Option<&str>) {
    let env_filter = filter.map_or_else(EnvFilter::from_default_env, EnvFilter::new);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}
