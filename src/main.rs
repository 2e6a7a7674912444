mod app;
mod chain;
mod components;
mod config;
mod logging;
mod resolver;
mod storage;
mod ui;

use color_eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    let config = config::AppConfig::from_env()?;
    logging::init(&config)?;
    let app = app::App::new(&config)?;
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}
