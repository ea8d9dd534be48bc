use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration: one `[calendars.<name>]` table per sync pair.
///
/// Pairs are processed in section-name order, so runs are deterministic.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendars: BTreeMap<String, CalendarSection>,
}

/// One destination calendar and the feed that mirrors into it.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarSection {
    /// Base URL of the CalDAV server, e.g. "https://cloud.example.com/"
    pub server: String,
    pub username: String,
    pub password: String,
    /// Name of the calendar collection to import into
    pub calendar: String,
    /// URL of the ICS feed to mirror from
    pub ics_url: String,
    pub ics_username: String,
    pub ics_password: String,
}

/// Get the default config file path (~/.config/icsync/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("icsync");
    Ok(config_dir.join("config.toml"))
}

/// Load config from the given path.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with one section per calendar pair:\n\n\
            [calendars.work]\n\
            server = \"https://cloud.example.com/\"\n\
            username = \"alice\"\n\
            password = \"app-password\"\n\
            calendar = \"team-events\"\n\
            ics_url = \"https://feeds.example.com/work.ics\"\n\
            ics_username = \"feed-user\"\n\
            ics_password = \"feed-pass\"",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}
