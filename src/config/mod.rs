//! Loader configuration
//!
//! Configuration is an explicitly constructed value passed to binding
//! loaders, not implicit global state. Build one at startup (typically
//! with [`Config::from_env`]) and hand it to `Xlib::load` and friends.
//!
//! Debug output goes through the `log` facade; binaries install a logger
//! (e.g. `env_logger`, which writes to stderr by default and can be
//! redirected at startup).

use std::env;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Log every resolved entry point at debug level
    pub debug: bool,

    /// Treat a missing symbol as fatal during binding load.
    ///
    /// With this disabled, [`crate::loader::SharedLibrary::lookup`] reports
    /// a missing symbol as `Ok(None)` after logging a warning, and the
    /// entry point stays unresolved. Calls through such an entry point are
    /// the caller's problem, exactly as with the native library itself.
    pub require_all_symbols: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            debug: false,
            require_all_symbols: true,
        }
    }
}

impl Config {
    /// Build a configuration from environment variables.
    ///
    /// `X11LINK_DEBUG=1` enables address logging and
    /// `X11LINK_NO_SYMBOL_CHECKS=1` tolerates missing symbols.
    pub fn from_env() -> Self {
        Config {
            debug: env_flag("X11LINK_DEBUG"),
            require_all_symbols: !env_flag("X11LINK_NO_SYMBOL_CHECKS"),
        }
    }

    /// Configuration for debugging sessions - logs everything, tolerates gaps
    pub fn permissive() -> Self {
        Config {
            debug: true,
            require_all_symbols: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requires_symbols() {
        let config = Config::default();
        assert!(!config.debug);
        assert!(config.require_all_symbols);
    }

    #[test]
    fn test_permissive_tolerates_missing_symbols() {
        let config = Config::permissive();
        assert!(config.debug);
        assert!(!config.require_all_symbols);
    }
}
