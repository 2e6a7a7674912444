use color_eyre::{Result, eyre::WrapErr};
use fjall::{Config, Keyspace, PartitionCreateOptions};
use std::{
    fs,
    path::{Path, PathBuf},
};

mod repositories;

pub use repositories::{SessionRecord, SettingsRepository};

pub struct Storage {
    root: PathBuf,
    #[allow(dead_code)]
    keyspace: Keyspace,
    settings: SettingsRepository,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .wrap_err_with(|| format!("failed to create storage dir {}", root.display()))?;

        let keyspace = Config::new(&root).open()?;
        let settings = keyspace.open_partition("settings", PartitionCreateOptions::default())?;

        Ok(Self {
            root,
            settings: SettingsRepository::new(settings),
            keyspace,
        })
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    #[allow(dead_code)]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
