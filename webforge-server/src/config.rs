//! Process configuration surface (§6): everything read from the
//! environment rather than the site DSL itself. A `.env` file in the
//! working directory is loaded before any of these are read, via the same
//! `dotenvy` pass the DSL's `$NAME` resolution relies on.

use std::env;
use std::path::PathBuf;

pub struct ServerConfig {
    pub site_path: PathBuf,
    pub addr_override: Option<String>,
    pub log_filter: String,
    pub pool_initial: usize,
    pub pool_max: usize,
}

const DEFAULT_SITE: &str = "site.web";
const DEFAULT_LOG: &str = "webforge=info";
const DEFAULT_POOL_INITIAL: usize = 20;
const DEFAULT_POOL_MAX: usize = 50;

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            site_path: env::var("WEBFORGE_SITE").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_SITE)),
            addr_override: env::var("WEBFORGE_ADDR").ok(),
            log_filter: env::var("WEBFORGE_LOG").unwrap_or_else(|_| DEFAULT_LOG.to_string()),
            pool_initial: env::var("WEBFORGE_POOL_INITIAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POOL_INITIAL),
            pool_max: env::var("WEBFORGE_POOL_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_POOL_MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hold_when_nothing_is_set() {
        env::remove_var("WEBFORGE_SITE");
        env::remove_var("WEBFORGE_ADDR");
        env::remove_var("WEBFORGE_LOG");
        env::remove_var("WEBFORGE_POOL_INITIAL");
        env::remove_var("WEBFORGE_POOL_MAX");
        let config = ServerConfig::from_env();
        assert_eq!(config.site_path, PathBuf::from(DEFAULT_SITE));
        assert!(config.addr_override.is_none());
        assert_eq!(config.log_filter, DEFAULT_LOG);
        assert_eq!(config.pool_initial, 20);
        assert_eq!(config.pool_max, 50);
    }
}
