use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to `config.toml` + environment
/// when nothing was initialized explicitly.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()))
        .load_full()
}

/// Initialize the global configuration from "config.toml" and `LT__*` env vars.
///
/// # Examples
/// ```no_run
/// use linktracker::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// Initialize the global configuration from an explicit file.
///
/// Unlike [`init_config`], load and validation errors are returned instead
/// of falling back to defaults: an explicit path is a user request.
pub fn init_config_from<P: AsRef<Path>>(path: P) -> Result<()> {
    let config = StaticConfig::load_from(Some(path.as_ref()))?;
    config.validate()?;
    set_config(config);
    Ok(())
}

/// Replace the global configuration.
pub fn set_config(config: StaticConfig) {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
        .store(Arc::new(config));
}
