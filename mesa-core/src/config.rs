use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct MesaConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Gemini triage model settings. The API key is NOT configured here —
/// it comes from the `GOOGLE_API_KEY` environment variable so the toml
/// file can be committed.
#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    pub model: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8750,
        }
    }
}

impl MesaConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        s.try_deserialize()
    }
}
