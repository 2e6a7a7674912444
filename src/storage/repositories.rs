use color_eyre::{Result, eyre::WrapErr};
use fjall::PartitionHandle;
use serde::{Deserialize, Serialize};

const SESSION_KEY: &str = "v1::session";

/// What the address bar showed when the app last exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionRecord {
    pub input: String,
    pub chain: Option<String>,
}

#[derive(Clone)]
pub struct SettingsRepository {
    handle: PartitionHandle,
}

impl SettingsRepository {
    pub(crate) fn new(handle: PartitionHandle) -> Self {
        Self { handle }
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .handle
            .get(key.as_bytes())
            .wrap_err("failed to read setting")?
            .map(|v| v.to_vec()))
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.handle
            .insert(key.as_bytes(), value)
            .wrap_err("failed to write setting")
    }

    pub fn session(&self) -> Result<Option<SessionRecord>> {
        self.get(SESSION_KEY)?
            .map(|raw| {
                serde_json::from_slice(&raw).wrap_err("failed to deserialize session record")
            })
            .transpose()
    }

    pub fn save_session(&self, record: &SessionRecord) -> Result<()> {
        let stored = serde_json::to_vec(record).wrap_err("failed to serialize session record")?;
        self.put(SESSION_KEY, &stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::tempdir;

    #[test]
    fn session_roundtrip() -> Result<()> {
        let temp = tempdir().unwrap();
        let storage = Storage::open(temp.path().join("store"))?;
        let settings = storage.settings();

        assert!(settings.session()?.is_none());
        let record = SessionRecord {
            input: "  alice.eth ".into(),
            chain: Some("Ethereum".into()),
        };
        settings.save_session(&record)?;
        assert_eq!(settings.session()?, Some(record));
        assert!(storage.root().ends_with("store"));

        Ok(())
    }

    #[test]
    fn corrupt_session_is_an_error() -> Result<()> {
        let temp = tempdir().unwrap();
        let storage = Storage::open(temp.path())?;
        storage.settings().put(SESSION_KEY, b"not json")?;
        assert!(storage.settings().session().is_err());
        Ok(())
    }
}
