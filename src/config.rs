use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{MeritError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub forum: ForumSettings,
    pub leaderboard: LeaderboardSettings,
    pub blob: BlobSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForumSettings {
    /// Thread URL up to, and excluding, the post offset
    pub base_url: String,
    pub user_agent: String,
    /// Only posts by this author are scanned for merit files
    pub author: String,
    pub page_size: u32,
    pub page_timeout_secs: u64,
    pub file_timeout_secs: u64,
    /// Shallow scans stop once a snapshot older than this many days is seen
    pub history_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardSettings {
    pub limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobSettings {
    pub api_url: String,
    pub pathname: String,
    pub api_version: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub token: Option<String>,
}

impl BlobSettings {
    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or(MeritError::MissingToken)
    }
}

impl Settings {
    /// Defaults, then the optional TOML file, then `MERIT_*` variables
    /// (`MERIT_FORUM__AUTHOR`, `MERIT_BLOB__TOKEN`, ...). `VERCEL_TOKEN` fills
    /// the blob token when nothing else set it.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::load_from(path, Self::environment())?;

        if settings.blob.token.is_none() {
            settings.blob.token = std::env::var("VERCEL_TOKEN").ok();
        }

        Ok(settings)
    }

    fn environment() -> Environment {
        Environment::with_prefix("MERIT")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(path: &Path, environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("forum.base_url", "https://bitcointalk.org/index.php?topic=3078328.")?
            .set_default("forum.user_agent", "Mozilla/5.0")?
            .set_default("forum.author", "LoyceV")?
            .set_default("forum.page_size", 20)?
            .set_default("forum.page_timeout_secs", 20)?
            .set_default("forum.file_timeout_secs", 30)?
            .set_default("forum.history_days", 130)?
            .set_default("leaderboard.limit", crate::leaderboard::DEFAULT_LIMIT as u64)?
            .set_default("blob.api_url", "https://blob.vercel-storage.com")?
            .set_default("blob.pathname", "leaderboard_latest.json")?
            .set_default("blob.api_version", "7")?
            .set_default("blob.timeout_secs", 60)?
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
