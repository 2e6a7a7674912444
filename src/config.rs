use color_eyre::Result;
use std::path::PathBuf;

const DATA_DIR_VAR: &str = "EVM_ADDRESS_TUI_DATA_DIR";
const CHAIN_VAR: &str = "EVM_ADDRESS_TUI_CHAIN";
const RPC_VAR: &str = "EVM_ADDRESS_TUI_RPC";
const LOG_VAR: &str = "EVM_ADDRESS_TUI_LOG";

const DEFAULT_LOG_FILTER: &str = "info";

/// Runtime settings collected from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub default_chain: Option<String>,
    /// Endpoint used for every name lookup instead of the chain's own list.
    pub rpc_override: Option<String>,
    pub log_filter: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let data_dir = match non_empty(DATA_DIR_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_data_dir()?,
        };
        Ok(Self {
            data_dir,
            default_chain: non_empty(CHAIN_VAR).map(|value| value.trim().to_string()),
            rpc_override: non_empty(RPC_VAR).map(|value| value.trim().to_string()),
            log_filter: non_empty(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    pub fn chains_file(&self) -> PathBuf {
        self.data_dir.join("chains.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("evm-address-tui.log")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let mut root = dirs::data_local_dir()
        .unwrap_or(std::env::current_dir()?)
        .join("evm-address-tui");
    if cfg!(debug_assertions) {
        root = root.join("dev");
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[test]
    fn explicit_values_are_used() {
        let config = config_from(&[
            (DATA_DIR_VAR, "/tmp/evm-address-tui"),
            (CHAIN_VAR, " Ethereum "),
            (RPC_VAR, "http://127.0.0.1:8545"),
            (LOG_VAR, "debug"),
        ]);

        assert_eq!(config.data_dir, PathBuf::from("/tmp/evm-address-tui"));
        assert_eq!(config.default_chain.as_deref(), Some("Ethereum"));
        assert_eq!(config.rpc_override.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(
            config.chains_file(),
            PathBuf::from("/tmp/evm-address-tui/chains.json")
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[(CHAIN_VAR, "   "), (RPC_VAR, "")]);

        assert!(config.data_dir.ends_with("evm-address-tui") || config.data_dir.ends_with("dev"));
        assert_eq!(config.default_chain, None);
        assert_eq!(config.rpc_override, None);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
