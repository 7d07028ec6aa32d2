//! Diagnostic logging to stderr.
//!
//! Silent by default apart from warnings; `RUST_LOG=enact_core=debug` shows
//! skipped lines, swallowed per-file errors, and discovery decisions.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .with_target(true)
        .try_init();
}
