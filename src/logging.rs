use crate::config::AppConfig;
use color_eyre::{Result, eyre::WrapErr};
use std::{fs, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to a log file; stdout is owned by the terminal UI.
pub fn init(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.data_dir)
        .wrap_err_with(|| format!("failed to create {}", config.data_dir.display()))?;
    let path = config.log_file();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .wrap_err_with(|| format!("invalid log filter \"{}\"", config.log_filter))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| color_eyre::eyre::eyre!("failed to install log subscriber: {err}"))?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(())
}
