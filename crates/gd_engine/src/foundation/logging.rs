//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system, falling back to `default_level` when
/// `RUST_LOG` is unset. Repeated calls are ignored.
pub fn init_with_level(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
