// ABOUTME: Shared logging setup for threadbot binaries
// ABOUTME: init_for() enables INFO for the named crates and WARN for everything else

use tracing_subscriber::EnvFilter;

/// Build the filter used by `init_for`. RUST_LOG directives are applied first.
pub fn filter_for(crate_names: &[&str]) -> EnvFilter {
    crate_names
        .iter()
        .fold(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
            |filter, name| match format!("{name}=info").parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            },
        )
}

/// Crate-filtered logging to stderr. Default: INFO for the named crates, WARN for everything else.
pub fn init_for(crate_names: &[&str]) {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(crate_names))
        .init();
}
