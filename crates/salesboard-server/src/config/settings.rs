use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub crm: CrmConfig,
    pub roster: RosterConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub page_limit: u32,
    pub closed_won_stage: String,
    /// No timeout unless set explicitly.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RosterConfig {
    pub data_file: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MediaConfig {
    pub static_dir: PathBuf,
    pub photos_dir: PathBuf,
    pub icons_dir: PathBuf,
    pub videos_dir: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            // 50 MiB, large enough for the per-person video upload
            .set_default("server.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("crm.base_url", "https://api.hubapi.com")?
            .set_default("crm.api_key", "")?
            .set_default("crm.page_limit", 100)?
            .set_default("crm.closed_won_stage", "2055465198")?
            .set_default("roster.data_file", "data.json")?
            .set_default("media.static_dir", "static")?
            .set_default("media.photos_dir", "static/uploads/photos")?
            .set_default("media.icons_dir", "static/uploads/icons")?
            .set_default("media.videos_dir", "static/uploads/videos")?
            .add_source(File::with_name("config/settings").required(false))
            // Example: APP__SERVER__PORT=8080
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        if settings.crm.api_key.is_empty() {
            settings.crm.api_key = std::env::var("HUBSPOT_API_KEY").unwrap_or_default();
        }
        if settings.crm.api_key.is_empty() {
            warn!("No CRM token configured (HUBSPOT_API_KEY); upstream calls will be rejected");
        }

        Ok(settings)
    }
}
