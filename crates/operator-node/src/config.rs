//! `NodeConfig`: everything this binary needs besides key material, which
//! keystore loading (explicitly out of scope) is responsible for handing
//! it at startup.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub bind_address: String,
    pub operator_address: String,
    /// `chain_id -> RPC endpoint URL`, chain id as its decimal string (TOML
    /// table keys are always strings; parsed on load).
    pub chain_rpc_endpoints: HashMap<String, String>,
    pub audit_log_path: PathBuf,
    pub revocation_set_path: PathBuf,
    #[serde(default)]
    pub work_tracker: WorkTrackerSettings,
    #[serde(default)]
    pub ritual_retry: RitualRetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkTrackerSettings {
    #[serde(default = "default_min_interval_secs")]
    pub min_interval_secs: u64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    #[serde(default)]
    pub abort_on_error: bool,
}

impl Default for WorkTrackerSettings {
    fn default() -> Self {
        WorkTrackerSettings {
            min_interval_secs: default_min_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            abort_on_error: false,
        }
    }
}

impl WorkTrackerSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }
}

fn default_min_interval_secs() -> u64 {
    60
}

fn default_max_interval_secs() -> u64 {
    30 * 60
}

#[derive(Debug, Clone, Deserialize)]
pub struct RitualRetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RitualRetrySettings {
    fn default() -> Self {
        RitualRetrySettings {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> u64 {
    2
}

fn default_max_delay_secs() -> u64 {
    30
}

impl NodeConfig {
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&contents)?)
    }

    /// Parsed `chain_id -> RPC endpoint URL` table, rejecting any key that
    /// isn't a valid `u64`.
    pub fn chain_endpoints(&self) -> anyhow::Result<HashMap<u64, String>> {
        self.chain_rpc_endpoints
            .iter()
            .map(|(chain_id, url)| Ok((chain_id.parse::<u64>()?, url.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_absent_sections() {
        let toml_src = r#"
            bind_address = "0.0.0.0:9151"
            operator_address = "0xabc"
            audit_log_path = "/tmp/audit.log"
            revocation_set_path = "/tmp/revoked.txt"

            [chain_rpc_endpoints]
            "1" = "http://localhost:8545"
        "#;
        let config: NodeConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.work_tracker.min_interval_secs, 60);
        assert_eq!(config.ritual_retry.max_attempts, 3);
        assert_eq!(config.chain_endpoints().unwrap().get(&1).unwrap(), "http://localhost:8545");
    }
}
