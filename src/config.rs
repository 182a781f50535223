//! Layered configuration for the sink's tunables.
//!
//! Mirrors the teacher's `config_v4` figment chain: built-in defaults,
//! overlaid by an optional TOML file, overlaid by `APPENDLOG_`-prefixed
//! environment variables. Loading is entirely optional — `SinkConfig`
//! implements `Default` with the values from the spec's tunables table,
//! and `LogSink::init` accepts a `SinkConfig` directly without ever
//! touching the filesystem unless the caller calls [`SinkConfig::load`].

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};

use crate::error::SinkResult;

/// Tunable constants governing the ring, rotation, and backpressure policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SinkConfig {
    /// Per-cell-buffer capacity in bytes (`C` in the spec). Default 30 MiB.
    #[serde(default = "default_cell_size_bytes")]
    pub cell_size_bytes: usize,

    /// Initial ring size (`N0`). Default 3.
    #[serde(default = "default_initial_ring_size")]
    pub initial_ring_size: usize,

    /// Upper bound on `N * cell_size_bytes`. Default 3 GiB.
    #[serde(default = "default_mem_cap_bytes")]
    pub mem_cap_bytes: usize,

    /// Size threshold that triggers a numbered rollover. Default 1 GiB.
    #[serde(default = "default_file_size_limit_bytes")]
    pub file_size_limit_bytes: u64,

    /// Maximum length of a single formatted record, in bytes. Default 1024.
    #[serde(default = "default_log_len_limit_bytes")]
    pub log_len_limit_bytes: usize,

    /// Persister wait timeout, in milliseconds. Default 1000 (1 s).
    #[serde(default = "default_persist_sleep_ms")]
    pub persist_sleep_ms: u64,

    /// Post-overload silent-drop window, in seconds. Default 3.
    #[serde(default = "default_drop_cooldown_secs")]
    pub drop_cooldown_secs: i64,
}

fn default_cell_size_bytes() -> usize {
    30 * 1024 * 1024
}
fn default_initial_ring_size() -> usize {
    3
}
fn default_mem_cap_bytes() -> usize {
    3 * 1024 * 1024 * 1024
}
fn default_file_size_limit_bytes() -> u64 {
    1024 * 1024 * 1024
}
fn default_log_len_limit_bytes() -> usize {
    1024
}
fn default_persist_sleep_ms() -> u64 {
    1000
}
fn default_drop_cooldown_secs() -> i64 {
    3
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            cell_size_bytes: default_cell_size_bytes(),
            initial_ring_size: default_initial_ring_size(),
            mem_cap_bytes: default_mem_cap_bytes(),
            file_size_limit_bytes: default_file_size_limit_bytes(),
            log_len_limit_bytes: default_log_len_limit_bytes(),
            persist_sleep_ms: default_persist_sleep_ms(),
            drop_cooldown_secs: default_drop_cooldown_secs(),
        }
    }
}

impl Provider for SinkConfig {
    fn metadata(&self) -> figment::Metadata {
        figment::Metadata::named("appendlog defaults")
    }

    fn data(
        &self,
    ) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        Serialized::defaults(SinkConfig::default()).data()
    }
}

impl SinkConfig {
    /// Load configuration layered as: built-in defaults, an optional TOML
    /// file at `toml_path` (ignored if absent), then `APPENDLOG_*`
    /// environment variables.
    pub fn load(toml_path: Option<&std::path::Path>) -> SinkResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(SinkConfig::default()));
        if let Some(path) = toml_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("APPENDLOG_"));
        let config: SinkConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity-check cross-field invariants the spec relies on (§3, §5).
    pub fn validate(&self) -> SinkResult<()> {
        if self.initial_ring_size == 0 {
            return Err(crate::error::SinkError::InvalidConfig(
                "initial_ring_size must be at least 1".into(),
            ));
        }
        if self.cell_size_bytes == 0 {
            return Err(crate::error::SinkError::InvalidConfig(
                "cell_size_bytes must be nonzero".into(),
            ));
        }
        if self.initial_ring_size.saturating_mul(self.cell_size_bytes) as u128
            > self.mem_cap_bytes as u128
        {
            return Err(crate::error::SinkError::InvalidConfig(format!(
                "initial ring of {} x {} bytes exceeds mem_cap_bytes of {}",
                self.initial_ring_size, self.cell_size_bytes, self.mem_cap_bytes
            )));
        }
        if self.log_len_limit_bytes * 16 > self.cell_size_bytes {
            return Err(crate::error::SinkError::InvalidConfig(
                "cell_size_bytes should be at least 16x log_len_limit_bytes".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = SinkConfig::default();
        assert_eq!(cfg.cell_size_bytes, 30 * 1024 * 1024);
        assert_eq!(cfg.initial_ring_size, 3);
        assert_eq!(cfg.mem_cap_bytes, 3 * 1024 * 1024 * 1024);
        assert_eq!(cfg.file_size_limit_bytes, 1024 * 1024 * 1024);
        assert_eq!(cfg.log_len_limit_bytes, 1024);
        assert_eq!(cfg.persist_sleep_ms, 1000);
        assert_eq!(cfg.drop_cooldown_secs, 3);
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_mem_cap_smaller_than_initial_ring() {
        let cfg = SinkConfig {
            mem_cap_bytes: 10,
            ..SinkConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_with_no_file_returns_defaults() {
        let cfg = SinkConfig::load(None).unwrap();
        assert_eq!(cfg, SinkConfig::default());
    }

    #[test]
    fn env_override_applies() {
        std::env::set_var("APPENDLOG_CELL_SIZE_BYTES", "4096000");
        let cfg = SinkConfig::load(None).unwrap();
        assert_eq!(cfg.cell_size_bytes, 4_096_000);
        std::env::remove_var("APPENDLOG_CELL_SIZE_BYTES");
    }
}
