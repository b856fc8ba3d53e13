use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.novant.io/v1/";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub novant: NovantSettings,
    pub query: QuerySettings,
    pub health: HealthSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NovantSettings {
    pub base_url: String,
    /// Used when a request carries no instance key of its own
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuerySettings {
    pub deadline_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthSettings {
    pub deadline_secs: u64,
}

impl NovantSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl QuerySettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl HealthSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(builder
        .set_default("server.listen_addr", "0.0.0.0:8080")?
        .set_default("novant.base_url", DEFAULT_BASE_URL)?
        .set_default("novant.timeout_secs", 30_i64)?
        .set_default("query.deadline_secs", 60_i64)?
        .set_default("health.deadline_secs", 10_i64)?)
}

/// `config/datasource.*` if present, then `NOVANT__SECTION__KEY` env vars
pub fn load_settings() -> anyhow::Result<Settings> {
    let settings = with_defaults(config::Config::builder())?
        .add_source(config::File::with_name("config/datasource").required(false))
        .add_source(config::Environment::with_prefix("NOVANT").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
