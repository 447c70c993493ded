use serde::Deserialize;
use std::env;

/// Every section except `server` is optional; startup selects backends by
/// which sections are present.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
    pub push: Option<PushConfig>,
    pub kafka: Option<KafkaConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushConfig {
    pub fcm_server_key: String,
    #[serde(default = "default_fcm_endpoint")]
    pub fcm_endpoint: String,
}

fn default_fcm_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_group_id")]
    pub group_id: String,
    #[serde(default = "default_booking_topic")]
    pub booking_topic: String,
}

fn default_group_id() -> String {
    "mishwar-notifications".to_string()
}

fn default_booking_topic() -> String {
    "booking.events".to_string()
}

pub fn run_mode() -> String {
    env::var("RUN_MODE").unwrap_or_else(|_| "development".into())
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = run_mode();

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer the run-mode file on top (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Environment variables with a MISHWAR prefix
            // Eg. `MISHWAR_SERVER__PORT=8081` sets `server.port`
            .add_source(config::Environment::with_prefix("MISHWAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
