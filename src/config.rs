//! Host-configured runtime limits.
//!
//! Everything here is a host decision, not a per-request one: data
//! directory, resource caps, and whether the SSRF gate runs. Behind the
//! `config-file` feature, [`RuntimeConfig`] can be loaded from a TOML file;
//! without it, construct one directly or via [`RuntimeConfig::default`].

use crate::constants::{TCP_BUFFER_SIZE_RANGE, TCP_SOCKET_LIMIT_RANGE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Host-wide configuration for one runtime instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Root directory under which per-binding SQL databases are stored, as
    /// `{data_dir}/sql/{database_id}.db`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum concurrent TCP sockets per request.
    #[serde(default = "default_max_tcp_sockets")]
    pub max_tcp_sockets: usize,

    /// Maximum bytes buffered per TCP socket's background read loop.
    #[serde(default = "default_max_tcp_buffer_size")]
    pub max_tcp_buffer_size: usize,

    /// Maximum value size accepted by the KV store binding.
    #[serde(default = "default_max_kv_value_size")]
    pub max_kv_value_size: usize,

    /// Whether the pre-connect SSRF gate runs before dialing outbound TCP.
    #[serde(default = "default_ssrf_filter_enabled")]
    pub ssrf_filter_enabled: bool,

    /// WebSocket keepalive ping interval, in seconds.
    #[serde(default = "default_ws_ping_interval_secs")]
    pub ws_ping_interval_secs: u64,
}

impl RuntimeConfig {
    /// Validates the configured caps against their allowed ranges.
    ///
    /// # Errors
    /// Returns a validation error naming which field is out of range.
    pub fn validate(&self) -> Result<()> {
        if !TCP_SOCKET_LIMIT_RANGE.contains(&self.max_tcp_sockets) {
            return Err(Error::validation(format!(
                "max_tcp_sockets must be in {TCP_SOCKET_LIMIT_RANGE:?}, got {}",
                self.max_tcp_sockets
            )));
        }
        if !TCP_BUFFER_SIZE_RANGE.contains(&self.max_tcp_buffer_size) {
            return Err(Error::validation(format!(
                "max_tcp_buffer_size must be in {TCP_BUFFER_SIZE_RANGE:?}, got {}",
                self.max_tcp_buffer_size
            )));
        }
        if self.max_kv_value_size == 0 {
            return Err(Error::validation("max_kv_value_size must be positive"));
        }
        Ok(())
    }

    /// Loads a config from a TOML file, applying defaults for any field the
    /// file omits, then validates it.
    ///
    /// # Errors
    /// Returns a runtime error if the file cannot be read or parsed, or a
    /// validation error if the parsed config is out of range.
    #[cfg(feature = "config-file")]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&text).map_err(|e| Error::runtime(format!("invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_tcp_sockets: default_max_tcp_sockets(),
            max_tcp_buffer_size: default_max_tcp_buffer_size(),
            max_kv_value_size: default_max_kv_value_size(),
            ssrf_filter_enabled: default_ssrf_filter_enabled(),
            ws_ping_interval_secs: default_ws_ping_interval_secs(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

const fn default_max_tcp_sockets() -> usize {
    20
}

const fn default_max_tcp_buffer_size() -> usize {
    16 * 1024 * 1024
}

const fn default_max_kv_value_size() -> usize {
    25 * 1024 * 1024
}

const fn default_ssrf_filter_enabled() -> bool {
    true
}

const fn default_ws_ping_interval_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_tcp_socket_cap_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.max_tcp_sockets = 0;
        assert!(config.validate().is_err());
        config.max_tcp_sockets = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_tcp_buffer_size_is_rejected() {
        let mut config = RuntimeConfig::default();
        config.max_tcp_buffer_size = 10;
        assert!(config.validate().is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn load_applies_defaults_for_omitted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runtime.toml");
        std::fs::write(&path, "max_tcp_sockets = 5\n").unwrap();
        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.max_tcp_sockets, 5);
        assert_eq!(config.max_kv_value_size, default_max_kv_value_size());
    }
}
