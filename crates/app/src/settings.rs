use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/pocketbook.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub level: String,
    pub owner: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./pocketbook.db?mode=rwc".to_string(),
            level: "info".to_string(),
            owner: "local".to_string(),
        }
    }
}

impl Settings {
    /// File, then `POCKETBOOK_*` environment, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(cli.config.is_some()))
            .add_source(config::Environment::with_prefix("POCKETBOOK"))
            .build()?
            .try_deserialize()?;

        if let Some(database_url) = &cli.database_url {
            settings.database_url = database_url.clone();
        }
        if let Some(level) = &cli.level {
            settings.level = level.clone();
        }
        if let Some(owner) = &cli.owner {
            settings.owner = owner.clone();
        }

        Ok(settings)
    }
}
