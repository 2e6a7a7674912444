use alloy::primitives::{Address, address};
use color_eyre::{Result, eyre::WrapErr};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// ENS registry shared by Ethereum mainnet and its public testnets.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

/// Network descriptor consumed by the address resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    pub chain_id: u64,
    /// Ordered RPC endpoints. Name lookups use the first one.
    pub rpc: Vec<String>,
    #[serde(default)]
    pub ens_registry: Option<Address>,
}

impl Chain {
    pub fn fantom() -> Self {
        Self {
            name: "Fantom".into(),
            chain_id: 250,
            rpc: vec![
                "https://rpc.ftm.tools".into(),
                "https://rpcapi.fantom.network".into(),
            ],
            ens_registry: None,
        }
    }

    pub fn fantom_testnet() -> Self {
        Self {
            name: "Fantom Testnet".into(),
            chain_id: 4002,
            rpc: vec!["https://rpc.testnet.fantom.network".into()],
            ens_registry: None,
        }
    }

    pub fn mainnet() -> Self {
        Self {
            name: "Ethereum".into(),
            chain_id: 1,
            rpc: vec![
                "https://eth.llamarpc.com".into(),
                "https://ethereum-rpc.publicnode.com".into(),
            ],
            ens_registry: Some(ENS_REGISTRY),
        }
    }

    pub fn sepolia() -> Self {
        Self {
            name: "Sepolia".into(),
            chain_id: 11155111,
            rpc: vec!["https://ethereum-sepolia-rpc.publicnode.com".into()],
            ens_registry: Some(ENS_REGISTRY),
        }
    }

    pub fn primary_rpc(&self) -> Option<&str> {
        self.rpc.first().map(String::as_str)
    }

    pub fn supports_ens(&self) -> bool {
        self.ens_registry.is_some()
    }

    fn matches(&self, name: &str) -> bool {
        normalize(&self.name) == normalize(name)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::fantom()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Ordered set of selectable chains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: Vec<Chain>,
    default_index: usize,
}

impl ChainRegistry {
    pub fn builtin() -> Self {
        Self {
            chains: vec![
                Chain::fantom(),
                Chain::fantom_testnet(),
                Chain::mainnet(),
                Chain::sepolia(),
            ],
            default_index: 0,
        }
    }

    /// Built-in chains merged with the user's `chains.json`, if present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut registry = Self::builtin();
        if !path.exists() {
            return Ok(registry);
        }
        let raw = fs::read(path)
            .wrap_err_with(|| format!("failed to read chain file {}", path.display()))?;
        let custom: Vec<Chain> = serde_json::from_slice(&raw)
            .wrap_err_with(|| format!("failed to parse chain file {}", path.display()))?;
        tracing::info!(count = custom.len(), path = %path.display(), "loaded custom chains");
        registry.extend(custom);
        Ok(registry)
    }

    /// Same-named chains are replaced in place, others appended.
    pub fn extend(&mut self, chains: impl IntoIterator<Item = Chain>) {
        for chain in chains {
            match self.chains.iter().position(|known| known.matches(&chain.name)) {
                Some(index) => self.chains[index] = chain,
                None => self.chains.push(chain),
            }
        }
    }

    pub fn set_default(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.default_index = index;
                true
            }
            None => false,
        }
    }

    pub fn default_chain(&self) -> &Chain {
        &self.chains[self.default_index]
    }

    pub fn find(&self, name: &str) -> Option<&Chain> {
        self.position(name).map(|index| &self.chains[index])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.chains.iter().position(|chain| chain.matches(name))
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_chain_is_fantom_without_ens() {
        let chain = Chain::default();
        assert_eq!(chain.chain_id, 250);
        assert_eq!(chain.primary_rpc(), Some("https://rpc.ftm.tools"));
        assert!(!chain.supports_ens());
        assert_eq!(ChainRegistry::builtin().default_chain(), &chain);
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let registry = ChainRegistry::builtin();
        let chain = registry.find("  ethereum ").expect("mainnet is built in");
        assert_eq!(chain.chain_id, 1);
        assert_eq!(chain.ens_registry, Some(ENS_REGISTRY));
        assert!(registry.find("solana").is_none());
    }

    #[test]
    fn extend_replaces_known_and_appends_new() {
        let mut registry = ChainRegistry::builtin();
        let before = registry.len();
        registry.extend([
            Chain {
                name: "fantom".into(),
                chain_id: 250,
                rpc: vec!["http://localhost:18545".into()],
                ens_registry: None,
            },
            Chain {
                name: "Local".into(),
                chain_id: 31337,
                rpc: vec!["http://127.0.0.1:8545".into()],
                ens_registry: Some(ENS_REGISTRY),
            },
        ]);

        assert_eq!(registry.len(), before + 1);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.default_chain().primary_rpc(),
            Some("http://localhost:18545")
        );
        assert_eq!(registry.find("local").map(|c| c.chain_id), Some(31337));
    }

    #[test]
    fn set_default_only_accepts_known_chains() {
        let mut registry = ChainRegistry::builtin();
        assert!(registry.set_default("Sepolia"));
        assert_eq!(registry.default_chain().chain_id, 11155111);
        assert!(!registry.set_default("unknown"));
        assert_eq!(registry.default_chain().chain_id, 11155111);
    }

    #[test]
    fn load_merges_chain_file() -> Result<()> {
        let temp = tempdir().unwrap();
        let path = temp.path().join("chains.json");
        fs::write(
            &path,
            r#"[{"name":"Anvil","chain_id":31337,"rpc":["http://127.0.0.1:8545"]}]"#,
        )?;

        let registry = ChainRegistry::load(&path)?;
        let anvil = registry.find("anvil").expect("custom chain loaded");
        assert_eq!(anvil.ens_registry, None);
        assert_eq!(anvil.primary_rpc(), Some("http://127.0.0.1:8545"));
        Ok(())
    }

    #[test]
    fn load_without_file_is_builtin() -> Result<()> {
        let temp = tempdir().unwrap();
        let registry = ChainRegistry::load(temp.path().join("missing.json"))?;
        assert_eq!(registry, ChainRegistry::builtin());
        Ok(())
    }
}
