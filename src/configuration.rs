use std::collections::HashMap;

use config::Config;
use config::ConfigError;
use config::FileFormat;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::Locale;
use crate::domain::Phase;

/// Top-level process configuration, loaded once at boot and never mutated —
/// a reload hook may swap in a freshly-loaded `Settings` between requests,
/// but nothing holds a `&mut Settings`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub pipeline: PipelineSettings,
    pub mail_source: MailSourceSettings,
    pub ticketing: TicketingSettings,
    pub llm: LlmSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    /// Port for the Postgres database; distinct from the application port.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name,
        ))
    }

    /// Connection string without a selected database — used by tests to
    /// create/drop a throwaway logical database per test run.
    pub fn connection_string_without_db(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
        ))
    }
}

/// Knobs from the spec's "Configuration keys" table that govern
/// Pipeline/Dispatcher/SupplierTracker/RetryScheduler behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    pub phase: Phase,
    pub confidence_threshold: f64,
    pub poll_interval_seconds: u64,
    pub supplier_reminder_hours: i64,
    pub max_ingest_retries: u32,
    pub max_send_retries: u32,
    pub internal_agents: Vec<String>,
    pub signature_lines: Vec<String>,
    pub ai_disclaimer: HashMap<String, String>,
    #[serde(default)]
    pub language_overrides: HashMap<String, Locale>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailSourceSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketingSettings {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    pub provider: String,
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

/// Loads hardcoded yaml configuration at `configuration.yaml`. All fields
/// must be present in this file, otherwise initialisation fails immediately
/// and the server does not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(config::File::new("configuration.yaml", FileFormat::Yaml))
        .build()?;
    settings.try_deserialize()
}
